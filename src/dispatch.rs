//! The consumer of the change stream.
//!
//! Between event-loop ticks, [handle_queued_changes] drains every queued
//! [Change] from the model and projects it onto X requests: mapping and
//! unmapping, geometry updates, focus and grab management, icon and
//! placeholder lifecycles. Two global reconciliations are deferred to the
//! end of each batch so that a burst of changes costs one pass: restacking
//! the visible windows, and reflowing the icon row.
//!
//! Errors from the server are transient here: each one is logged and the
//! batch keeps draining. The next change is the recovery opportunity.
use crate::{
    config::WmConfig,
    pure::{
        geometry::{Point, Rect},
        model::{ClientModel, CpsMode},
        Change, Desktop,
    },
    x::{Icon, MoveResizeKind, XConn, XModel, EXPECT_MAP, EXPECT_UNMAP},
    Result, Xid,
};
use tracing::{error, trace, warn};

/// The border color of the focused window (argb)
pub const FOCUSED_BORDER: u32 = 0xff000000;
/// The border color of unfocused windows (argb)
pub const UNFOCUSED_BORDER: u32 = 0xffffffff;

/// Drain every queued change from the model and apply the matching side
/// effects, then run any deferred relayer / icon reflow.
pub fn handle_queued_changes<X: XConn>(
    x: &X,
    config: &WmConfig,
    model: &mut ClientModel,
    xmodel: &mut XModel,
) {
    let mut batch = Batch {
        x,
        config,
        model,
        xmodel,
        should_relayer: false,
        should_reflow_icons: false,
    };

    while let Some(change) = batch.model.next_change() {
        trace!(?change, "dispatching change");
        if let Err(e) = batch.dispatch(&change) {
            error!(%e, ?change, "error applying change");
        }
    }

    if batch.should_relayer {
        if let Err(e) = batch.relayer() {
            error!(%e, "error relayering visible windows");
        }
    }

    if batch.should_reflow_icons {
        if let Err(e) = batch.reposition_icons() {
            error!(%e, "error repositioning icons");
        }
    }
}

struct Batch<'a, X: XConn> {
    x: &'a X,
    config: &'a WmConfig,
    model: &'a mut ClientModel,
    xmodel: &'a mut XModel,
    should_relayer: bool,
    should_reflow_icons: bool,
}

impl<'a, X: XConn> Batch<'a, X> {
    fn dispatch(&mut self, change: &Change) -> Result<()> {
        match *change {
            Change::Layer { .. } => {
                // restacking happens once at the end of the batch
                self.should_relayer = true;
                Ok(())
            }
            Change::Focus { prev, next } => self.handle_focus(prev, next),
            Change::ClientDesktop { window, prev, next } => {
                self.handle_client_desktop(window, prev, next)
            }
            Change::CurrentDesktop { prev, next } => self.handle_current_desktop(prev, next),
            Change::Screen { window, bounds } => self.handle_screen(window, bounds),
            Change::Mode { window, mode } => self.handle_mode(window, mode),
            Change::Location { window, x, y } => self.x.move_window(window, x, y),
            Change::Size { window, w, h } => self.x.resize_window(window, w, h),
            Change::ChildAdd { .. } => {
                self.should_relayer = true;
                Ok(())
            }
            Change::ChildRemove { .. } => Ok(()),
            Change::Unmap { window } => self.handle_unmap(window),
            Change::Destroy {
                window,
                last_desktop,
                ..
            } => self.handle_destroy(window, last_desktop),
        }
    }

    // The focus model is click-to-focus: unfocused windows have their
    // clicks grabbed so the manager hears about them, the focused window
    // gets its clicks back.
    fn handle_focus(&mut self, prev: Option<Xid>, next: Option<Xid>) -> Result<()> {
        if let Some(p) = prev {
            if self.model.is_client(p) || self.model.is_child(p) {
                if self.config.border_width > 0 {
                    self.x.set_border_color(p, UNFOCUSED_BORDER)?;
                }
                self.x.grab_mouse(p)?;
            }
        }

        match next {
            Some(w) => {
                if self.x.set_input_focus(w).is_ok() {
                    if self.config.border_width > 0 {
                        self.x.set_border_color(w, FOCUSED_BORDER)?;
                    }
                    self.x.ungrab_mouse(w)?;
                } else {
                    // the target would not take focus; move on to the next
                    // window in the cycle and keep the original grabbed
                    warn!(%w, "could not focus window, advancing the focus cycle");
                    self.model.cycle_focus_forward();
                    if self.config.border_width > 0 {
                        self.x.set_border_color(w, UNFOCUSED_BORDER)?;
                    }
                    self.x.grab_mouse(w)?;
                }
            }
            None => self.x.focus_root()?,
        }

        self.should_relayer = true;

        Ok(())
    }

    fn handle_client_desktop(
        &mut self,
        window: Xid,
        prev: Option<Desktop>,
        next: Desktop,
    ) -> Result<()> {
        use Desktop::*;

        match (prev, next) {
            // Freshly managed clients
            (None, User(_)) => {
                if self.model.is_visible_desktop(next) && self.model.is_mapped(window) {
                    self.show_client(window)?;
                    self.should_relayer = true;
                }
                Ok(())
            }
            (None, Icon) => self.register_new_icon(window, true),

            (Some(p @ User(_)), User(_)) => {
                let was = self.model.is_visible_desktop(p);
                let will = self.model.is_visible_desktop(next);
                if was && !will {
                    self.hide_client(window)?;
                    self.should_relayer = true;
                } else if !was && will {
                    self.show_client(window)?;
                    self.should_relayer = true;
                }
                Ok(())
            }
            (Some(p @ User(_)), AllDesktops) => {
                if !self.model.is_visible_desktop(p) {
                    self.show_client(window)?;
                    self.should_relayer = true;
                }
                Ok(())
            }
            (Some(AllDesktops), User(_)) => {
                if !self.model.is_visible_desktop(next) {
                    self.hide_client(window)?;
                    self.should_relayer = true;
                }
                Ok(())
            }

            (Some(p), Icon) if p.is_user() || p.is_all() => {
                let was = self.model.is_visible_desktop(p);
                if was {
                    self.unmap_unfocus_children(window)?;
                }
                self.register_new_icon(window, was)
            }
            (Some(p), Moving) if p.is_user() || p.is_all() => {
                self.unmap_unfocus_children(window)?;
                self.start_gesture(window, MoveResizeKind::Move)
            }
            (Some(p), Resizing) if p.is_user() || p.is_all() => {
                self.unmap_unfocus_children(window)?;
                self.start_gesture(window, MoveResizeKind::Resize)
            }

            (Some(Icon), n) if n.is_user() || n.is_all() => self.remove_icon(window, n),
            (Some(Moving), n) if n.is_user() || n.is_all() => {
                self.finish_gesture(window, n, MoveResizeKind::Move)
            }
            (Some(Resizing), n) if n.is_user() || n.is_all() => {
                self.finish_gesture(window, n, MoveResizeKind::Resize)
            }

            (prev, next) => {
                warn!(%window, ?prev, ?next, "unanticipated desktop transition");
                Ok(())
            }
        }
    }

    fn handle_current_desktop(&mut self, prev: Desktop, next: Desktop) -> Result<()> {
        for w in self.model.get_clients_of(prev) {
            if !self.model.is_mapped(w) {
                continue;
            }
            self.xmodel.set_effect(w, EXPECT_UNMAP);
            self.x.unmap(w)?;
            self.unmap_unfocus_children(w)?;
        }

        for w in self.model.get_clients_of(next) {
            if !self.model.is_mapped(w) {
                continue;
            }
            self.xmodel.set_effect(w, EXPECT_MAP);
            self.x.map(w)?;
            self.map_children(w)?;
        }

        self.should_relayer = true;

        Ok(())
    }

    fn handle_screen(&mut self, window: Xid, bounds: Rect) -> Result<()> {
        match self.model.get_mode(window) {
            None => Ok(()),

            // Floating clients are clamped into their new monitor
            Some(CpsMode::Floating) => {
                let geom = self.x.get_geometry(window)?;

                let mut w = geom.w;
                let mut h = geom.h;
                if geom.x + geom.w as i32 > bounds.right() {
                    w = (bounds.right() - geom.x).max(1) as u32;
                }
                if geom.y + geom.h as i32 > bounds.bottom() {
                    h = (bounds.bottom() - geom.y).max(1) as u32;
                }
                self.model.change_size(window, w, h);

                let mut x = geom.x;
                let mut y = geom.y;
                if !(bounds.x..bounds.right()).contains(&geom.x) {
                    x = bounds.x;
                }
                if !(bounds.y..bounds.bottom()).contains(&geom.y) {
                    y = bounds.y;
                }
                self.model.change_location(window, x, y);

                Ok(())
            }

            // Tiled clients are recomputed from the mode formulas
            Some(mode) => {
                self.apply_mode_geometry(window, mode, bounds);
                Ok(())
            }
        }
    }

    fn handle_mode(&mut self, window: Xid, mode: CpsMode) -> Result<()> {
        if mode == CpsMode::Floating {
            // floating imposes nothing on the window
            return Ok(());
        }

        if let Some(screen) = self.model.get_screen(window) {
            self.apply_mode_geometry(window, mode, screen);
        }

        Ok(())
    }

    fn apply_mode_geometry(&mut self, window: Xid, mode: CpsMode, screen: Rect) {
        let is_root = self.model.get_root_screen() == Some(screen);
        let (pos, size) = mode_geometry(
            mode,
            screen,
            is_root,
            self.config.border_width,
            self.config.icon_height,
        );

        self.model.change_location(window, pos.x, pos.y);
        self.model.change_size(window, size.0, size.1);
    }

    fn handle_unmap(&mut self, window: Xid) -> Result<()> {
        self.unmap_unfocus_children(window)
    }

    fn handle_destroy(&mut self, window: Xid, last_desktop: Desktop) -> Result<()> {
        match last_desktop {
            Desktop::Icon => match self.xmodel.unregister_icon(window) {
                Some(icon) => {
                    self.x.destroy_window(icon.window)?;
                    self.x.free_gc(icon.gc)?;
                    self.should_reflow_icons = true;
                    Ok(())
                }
                None => {
                    error!(%window, "destroyed client should have an icon but none is registered");
                    Ok(())
                }
            },

            Desktop::Moving | Desktop::Resizing => match self.xmodel.exit_move_resize() {
                Some(mr) => {
                    self.x.release_pointer()?;
                    self.x.destroy_window(mr.placeholder)
                }
                None => {
                    error!(%window, "destroyed client should be mid-gesture but no gesture is active");
                    Ok(())
                }
            },

            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Visibility helpers

    fn show_client(&mut self, window: Xid) -> Result<()> {
        self.xmodel.set_effect(window, EXPECT_MAP);
        self.x.map(window)?;
        if self.model.is_autofocus(window) {
            self.model.focus(window);
        }
        self.map_children(window)
    }

    fn hide_client(&mut self, window: Xid) -> Result<()> {
        self.xmodel.set_effect(window, EXPECT_UNMAP);
        self.model.unfocus_if_focused(window);
        self.x.unmap(window)?;
        self.unmap_unfocus_children(window)
    }

    fn map_children(&mut self, parent: Xid) -> Result<()> {
        for c in self.model.get_children_of(parent) {
            self.xmodel.set_effect(c, EXPECT_MAP);
            self.x.map(c)?;
        }

        Ok(())
    }

    fn unmap_unfocus_children(&mut self, parent: Xid) -> Result<()> {
        for c in self.model.get_children_of(parent) {
            self.xmodel.set_effect(c, EXPECT_UNMAP);
            self.model.unfocus_if_focused(c);
            self.x.unmap(c)?;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Icons

    fn register_new_icon(&mut self, client: Xid, do_unmap: bool) -> Result<()> {
        let r = Rect::new(0, 0, self.config.icon_width, self.config.icon_height);
        let window = self.x.create_window(r)?;
        self.x.map(window)?;
        let gc = self.x.create_gc(window)?;

        self.model.unfocus_if_focused(client);
        if do_unmap {
            self.xmodel.set_effect(client, EXPECT_UNMAP);
            self.x.unmap(client)?;
        }

        self.xmodel.register_icon(Icon { client, window, gc });
        self.should_reflow_icons = true;

        Ok(())
    }

    fn remove_icon(&mut self, client: Xid, target: Desktop) -> Result<()> {
        let icon = match self.xmodel.unregister_icon(client) {
            Some(icon) => icon,
            None => {
                error!(%client, "client is leaving the icon desktop but has no icon");
                return Ok(());
            }
        };

        self.x.destroy_window(icon.window)?;
        self.x.free_gc(icon.gc)?;

        if self.model.is_visible_desktop(target) && self.model.is_mapped(client) {
            self.show_client(client)?;
            self.should_relayer = true;
        }

        self.should_reflow_icons = true;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Move / resize placeholders

    fn start_gesture(&mut self, client: Xid, kind: MoveResizeKind) -> Result<()> {
        let geom = self.x.get_geometry(client)?;
        let placeholder = self.x.create_window(geom)?;
        self.x.map(placeholder)?;
        self.x.confine_pointer(placeholder)?;
        self.should_relayer = true;

        self.xmodel.set_effect(client, EXPECT_UNMAP);
        self.model.unfocus_if_focused(client);
        self.x.unmap(client)?;

        let pointer = self.x.cursor_position().unwrap_or_default();
        match kind {
            MoveResizeKind::Move => self.xmodel.enter_move(client, placeholder, pointer),
            MoveResizeKind::Resize => self.xmodel.enter_resize(client, placeholder, pointer),
        }

        Ok(())
    }

    fn finish_gesture(&mut self, client: Xid, target: Desktop, kind: MoveResizeKind) -> Result<()> {
        let mr = match self.xmodel.exit_move_resize() {
            Some(mr) => mr,
            None => {
                error!(%client, "client is leaving a gesture desktop but no gesture is active");
                return Ok(());
            }
        };

        // The pointer grab and the placeholder are released whether or not
        // the geometry query works out.
        let geom = self.x.get_geometry(mr.placeholder);
        self.x.release_pointer()?;
        self.x.destroy_window(mr.placeholder)?;

        match (kind, geom) {
            (MoveResizeKind::Move, Ok(g)) => self.x.move_window(client, g.x, g.y)?,
            (MoveResizeKind::Resize, Ok(g)) => self.x.resize_window(client, g.w, g.h)?,
            (_, Err(e)) => error!(%e, %client, "could not read final placeholder geometry"),
        }

        if self.model.is_visible_desktop(target) && self.model.is_mapped(client) {
            self.show_client(client)?;
            self.should_relayer = true;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Deferred reconciliations

    // Raise each visible family in ascending layer order, splicing the
    // focused family in at the top of its own layer, then the icons above
    // everything, then the gesture placeholder above even those.
    fn relayer(&self) -> Result<()> {
        let ordered = self.model.get_visible_in_layer_order();

        let mut focused = self.model.get_focused();
        if let Some(f) = focused {
            if self.model.is_child(f) {
                focused = self.model.get_parent_of(f);
            }
        }
        let focused_layer = focused.and_then(|f| self.model.find_layer(f));

        for w in ordered {
            if let (Some(f), Some(fl)) = (focused, focused_layer) {
                let layer = self.model.find_layer(w).unwrap_or_default();
                if layer > fl {
                    self.raise_family(f)?;
                    focused = None;
                }
            }

            if focused != Some(w) {
                self.raise_family(w)?;
            }
        }

        if let Some(f) = focused {
            self.raise_family(f)?;
        }

        for icon in self.xmodel.icons() {
            self.x.raise(icon.window)?;
        }

        if let Some(placeholder) = self.xmodel.placeholder() {
            self.x.raise(placeholder)?;
        }

        Ok(())
    }

    fn raise_family(&self, client: Xid) -> Result<()> {
        self.x.raise(client)?;
        for c in self.model.get_children_of(client) {
            self.x.raise(c)?;
        }

        Ok(())
    }

    // Lay the icons out left to right, top to bottom, anchored at the root
    // screen origin and wrapping at its width.
    fn reposition_icons(&self) -> Result<()> {
        let root = match self.model.get_root_screen() {
            Some(r) => r,
            None => return Ok(()),
        };

        let (iw, ih) = (self.config.icon_width, self.config.icon_height);
        let mut x_off = 0;
        let mut y_off = 0;

        for icon in self.xmodel.icons() {
            if x_off + iw > root.w {
                x_off = 0;
                y_off += ih;
            }

            self.x
                .move_window(icon.window, root.x + x_off as i32, root.y + y_off as i32)?;
            x_off += iw;
        }

        Ok(())
    }
}

/// The position and size a tiled client takes on its screen.
///
/// `t` is the top of the usable area: the root screen reserves the icon row
/// height at the top, other screens are usable from their own top edge.
/// Splits divide the usable area at its midpoint, and every dimension loses
/// two border widths so the bordered window fits the slot exactly.
pub(crate) fn mode_geometry(
    mode: CpsMode,
    s: Rect,
    is_root: bool,
    border_width: u32,
    icon_row_height: u32,
) -> (Point, (u32, u32)) {
    let b2 = 2 * border_width as i32;
    let t = if is_root {
        s.y + icon_row_height as i32
    } else {
        s.y
    };
    let m_x = s.x + (s.w / 2) as i32;
    let m_y = t + (s.bottom() - t) / 2;

    let full_w = (s.w as i32 - b2).max(1) as u32;
    let full_h = (s.bottom() - t - b2).max(1) as u32;

    match mode {
        CpsMode::Max => (Point::new(s.x, t), (full_w, full_h)),
        CpsMode::SplitLeft => (Point::new(s.x, t), ((m_x - s.x - b2).max(1) as u32, full_h)),
        CpsMode::SplitRight => (
            Point::new(m_x, t),
            ((s.right() - m_x - b2).max(1) as u32, full_h),
        ),
        CpsMode::SplitTop => (Point::new(s.x, t), (full_w, (m_y - t - b2).max(1) as u32)),
        CpsMode::SplitBottom => (
            Point::new(s.x, m_y),
            (full_w, (s.bottom() - m_y - b2).max(1) as u32),
        ),
        CpsMode::Floating => unreachable!("floating clients have no managed geometry"),
    }
}
