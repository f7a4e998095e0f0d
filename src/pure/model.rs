//! The authoritative client state store.
//!
//! [ClientModel] owns every managed client and all of the state dimensions
//! that interact: desktop placement, stacking layer, location and size,
//! position/scale mode, pack slots, parent/child links, the focus cycle and
//! the single in-progress move or resize. Each public mutator either emits a
//! precise sequence of [Change] events or is a documented no-op that emits
//! nothing; the cross-dimension invariants hold between any two public
//! calls.
//!
//! Nothing here talks to the display server. The dispatcher reads the
//! change stream and performs the projection.
use crate::{
    pure::{
        change::{Change, ChangeStream},
        desktop::Desktop,
        focus::FocusCycle,
        geometry::{Corner, Direction, Point, Rect},
        screen::ScreenGraph,
    },
    Xid,
};
use std::{
    collections::HashMap,
    io::{self, Write},
};
use tracing::{debug, error};

/// An integer stacking band; higher layers are drawn above lower ones.
pub type Layer = u8;

/// The lowest stacking layer.
pub const MIN_LAYER: Layer = 1;
/// The highest stacking layer.
pub const MAX_LAYER: Layer = 9;
/// The layer new clients start on.
pub const DEF_LAYER: Layer = 5;

/// The position/scale discipline applied to a client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CpsMode {
    /// The user controls position and size freely
    Floating,
    /// Snapped to the left half of the client's screen
    SplitLeft,
    /// Snapped to the right half of the client's screen
    SplitRight,
    /// Snapped to the top half of the client's screen
    SplitTop,
    /// Snapped to the bottom half of the client's screen
    SplitBottom,
    /// Filling the client's screen
    Max,
}

impl std::fmt::Display for CpsMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CpsMode::Floating => "floating",
            CpsMode::SplitLeft => "split-left",
            CpsMode::SplitRight => "split-right",
            CpsMode::SplitTop => "split-top",
            CpsMode::SplitBottom => "split-bottom",
            CpsMode::Max => "max",
        };
        write!(f, "{s}")
    }
}

/// Whether a window was viewable when it was first managed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InitialVisibility {
    /// The window is viewable and should be shown immediately
    Visible,
    /// The window exists but is not viewable yet; the dispatcher must not
    /// map it until it becomes visible through a later change
    Hidden,
}

/// Everything the model tracks for a single managed client.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Client {
    desktop: Desktop,
    prev_desktop: Option<Desktop>,
    layer: Layer,
    location: Point,
    size: (u32, u32),
    mode: CpsMode,
    packed: Option<(Corner, u64)>,
    autofocus: bool,
    mapped: bool,
    screen: Rect,
}

/// The in-memory authoritative representation of all managed clients.
#[derive(Debug, Default, Clone)]
pub struct ClientModel {
    num_desktops: usize,
    current_desktop: usize,
    clients: HashMap<Xid, Client>,
    order: Vec<Xid>,
    children: HashMap<Xid, Vec<Xid>>,
    parents: HashMap<Xid, Xid>,
    focused: Option<Xid>,
    desktop_focus: HashMap<usize, Xid>,
    cycle: FocusCycle,
    screens: ScreenGraph,
    gesture: Option<Xid>,
    changes: ChangeStream,
}

impl ClientModel {
    /// Create an empty model with the given number of user desktops and the
    /// currently connected monitor boxes. `num_desktops` is clamped to at
    /// least one.
    pub fn new(num_desktops: usize, screens: Vec<Rect>) -> Self {
        Self {
            num_desktops: num_desktops.max(1),
            screens: ScreenGraph::new(screens),
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------
    // The change stream

    /// Take ownership of the oldest queued change, if any.
    pub fn next_change(&mut self) -> Option<Change> {
        self.changes.next_change()
    }

    /// True if there are queued changes waiting to be dispatched.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Discard all queued changes.
    pub fn flush_changes(&mut self) {
        self.changes.flush();
    }

    /// Drain all queued changes into a Vec (test helper, but harmless to
    /// call from anywhere).
    pub fn drain_changes(&mut self) -> Vec<Change> {
        let mut out = Vec::with_capacity(self.changes.len());
        while let Some(c) = self.changes.next_change() {
            out.push(c);
        }
        out
    }

    // ------------------------------------------------------------------
    // Queries

    /// The number of user desktops.
    pub fn num_desktops(&self) -> usize {
        self.num_desktops
    }

    /// The currently shown user desktop.
    pub fn current_desktop(&self) -> Desktop {
        Desktop::User(self.current_desktop)
    }

    /// Is this window a managed client?
    pub fn is_client(&self, w: Xid) -> bool {
        self.clients.contains_key(&w)
    }

    /// Is this window a transient child of a managed client?
    pub fn is_child(&self, w: Xid) -> bool {
        self.parents.contains_key(&w)
    }

    /// Would a client on this desktop currently be shown?
    pub fn is_visible_desktop(&self, d: Desktop) -> bool {
        d.visible_on(self.current_desktop)
    }

    /// Is this client (or child) currently shown on screen?
    pub fn is_visible(&self, w: Xid) -> bool {
        match self.clients.get(&w) {
            Some(c) => c.mapped && c.desktop.visible_on(self.current_desktop),
            None => match self.parents.get(&w) {
                Some(&p) => self.is_visible(p),
                None => false,
            },
        }
    }

    /// Is this client still mapped by its application?
    pub fn is_mapped(&self, w: Xid) -> bool {
        self.clients.get(&w).map(|c| c.mapped).unwrap_or(false)
    }

    /// Did this client ask to receive focus automatically?
    pub fn is_autofocus(&self, w: Xid) -> bool {
        self.clients.get(&w).map(|c| c.autofocus).unwrap_or(false)
    }

    /// The window currently holding the input focus.
    pub fn get_focused(&self) -> Option<Xid> {
        self.focused
    }

    /// The desktop a client is currently on.
    pub fn find_desktop(&self, w: Xid) -> Option<Desktop> {
        self.clients.get(&w).map(|c| c.desktop)
    }

    /// The stacking layer a client is currently on.
    pub fn find_layer(&self, w: Xid) -> Option<Layer> {
        self.clients.get(&w).map(|c| c.layer)
    }

    /// The position/scale mode of a client.
    pub fn get_mode(&self, w: Xid) -> Option<CpsMode> {
        self.clients.get(&w).map(|c| c.mode)
    }

    /// The location of a client.
    pub fn get_location(&self, w: Xid) -> Option<Point> {
        self.clients.get(&w).map(|c| c.location)
    }

    /// The size of a client.
    pub fn get_size(&self, w: Xid) -> Option<(u32, u32)> {
        self.clients.get(&w).map(|c| c.size)
    }

    /// The bounds of the monitor a client is homed to.
    pub fn get_screen(&self, w: Xid) -> Option<Rect> {
        self.clients.get(&w).map(|c| c.screen)
    }

    /// The bounds of the root monitor (the one hosting the icon row).
    pub fn get_root_screen(&self) -> Option<Rect> {
        self.screens.root()
    }

    /// The parent of a transient child window.
    pub fn get_parent_of(&self, child: Xid) -> Option<Xid> {
        self.parents.get(&child).copied()
    }

    /// The children of a client, in the order they were added.
    pub fn get_children_of(&self, parent: Xid) -> Vec<Xid> {
        self.children.get(&parent).cloned().unwrap_or_default()
    }

    /// All clients whose desktop is exactly `d`, in insertion order.
    pub fn get_clients_of(&self, d: Desktop) -> Vec<Xid> {
        self.order
            .iter()
            .filter(|&&w| self.clients[&w].desktop == d)
            .copied()
            .collect()
    }

    /// All currently visible clients, in insertion order.
    pub fn get_visible_clients(&self) -> Vec<Xid> {
        self.order
            .iter()
            .filter(|&&w| self.is_visible(w))
            .copied()
            .collect()
    }

    /// All currently visible clients in ascending layer order. Clients on
    /// the same layer keep their insertion order.
    pub fn get_visible_in_layer_order(&self) -> Vec<Xid> {
        let mut visible = self.get_visible_clients();
        visible.sort_by_key(|w| self.clients[w].layer);
        visible
    }

    /// Can this window take the input focus right now?
    pub fn is_focusable(&self, w: Xid) -> bool {
        self.is_visible(w)
    }

    // ------------------------------------------------------------------
    // Lifecycle

    /// Start managing a new client on the current desktop at the default
    /// layer. No-op if the window is already known as a client or child.
    pub fn add_client(
        &mut self,
        w: Xid,
        hint: InitialVisibility,
        location: Point,
        size: (u32, u32),
        autofocus: bool,
    ) {
        if self.is_client(w) || self.is_child(w) || size.0 < 1 || size.1 < 1 {
            debug!(%w, "ignoring add_client for known or degenerate window");
            return;
        }

        let screen = self
            .screens
            .containing(location)
            .or_else(|| self.screens.root())
            .unwrap_or_default();

        let mapped = hint == InitialVisibility::Visible;
        self.clients.insert(
            w,
            Client {
                desktop: Desktop::User(self.current_desktop),
                prev_desktop: None,
                layer: DEF_LAYER,
                location,
                size,
                mode: CpsMode::Floating,
                packed: None,
                autofocus,
                mapped,
                screen,
            },
        );
        self.order.push(w);
        self.cycle.add(w);

        self.changes.push(Change::ClientDesktop {
            window: w,
            prev: None,
            next: Desktop::User(self.current_desktop),
        });
        self.changes.push(Change::Layer {
            window: w,
            layer: DEF_LAYER,
        });

        if autofocus && mapped {
            self.set_focus(Some(w));
        }
    }

    /// Stop managing a client: focus is released, children are detached in
    /// insertion order and a final destroy record carries the client's last
    /// desktop and layer.
    pub fn remove_client(&mut self, w: Xid) {
        let (last_desktop, last_layer) = match self.clients.get(&w) {
            Some(c) => (c.desktop, c.layer),
            None => return,
        };

        if self.family_holds_focus(w) {
            self.set_focus(None);
        }

        for child in self.children.remove(&w).unwrap_or_default() {
            self.parents.remove(&child);
            self.cycle.remove(child);
            self.changes.push(Change::ChildRemove { parent: w, child });
        }

        self.clients.remove(&w);
        self.order.retain(|&x| x != w);
        self.cycle.remove(w);
        self.desktop_focus.retain(|_, v| *v != w);
        if self.gesture == Some(w) {
            self.gesture = None;
        }

        self.changes.push(Change::Destroy {
            window: w,
            last_desktop,
            last_layer,
        });
    }

    // ------------------------------------------------------------------
    // Iconification

    /// Minimize a client. Only clients on a user desktop or the sticky
    /// plane can be iconified.
    pub fn iconify(&mut self, w: Xid) {
        match self.find_desktop(w) {
            Some(d) if d.is_user() || d.is_all() => (),
            _ => return,
        }

        if self.family_holds_focus(w) {
            self.set_focus(None);
        }
        self.transition_desktop(w, Desktop::Icon);
    }

    /// Restore a minimized client to the current desktop (or the sticky
    /// plane if it was sticky when iconified), focusing it if it asked for
    /// automatic focus.
    pub fn deiconify(&mut self, w: Xid) {
        match self.find_desktop(w) {
            Some(Desktop::Icon) => (),
            _ => return,
        }

        let target = self.restore_target(w);
        self.transition_desktop(w, target);

        if self.is_autofocus(w) && self.is_focusable(w) {
            self.set_focus(Some(w));
        }
    }

    // ------------------------------------------------------------------
    // Interactive move / resize

    /// Begin an interactive move. No-op while any other gesture is active
    /// or if the client is iconified / already mid-gesture.
    pub fn start_moving(&mut self, w: Xid) {
        self.start_gesture(w, Desktop::Moving);
    }

    /// Begin an interactive resize. Same preconditions as
    /// [start_moving][ClientModel::start_moving].
    pub fn start_resizing(&mut self, w: Xid) {
        self.start_gesture(w, Desktop::Resizing);
    }

    /// End an interactive move, restoring the client's desktop and applying
    /// the final location.
    pub fn stop_moving(&mut self, w: Xid, new_loc: Point) {
        if self.find_desktop(w) != Some(Desktop::Moving) {
            return;
        }

        let target = self.restore_target(w);
        self.transition_desktop(w, target);
        self.gesture = None;

        self.change_location(w, new_loc.x, new_loc.y);

        if self.is_autofocus(w) && self.is_focusable(w) {
            self.set_focus(Some(w));
        }
    }

    /// End an interactive resize, restoring the client's desktop and
    /// applying the final size. A degenerate size is rejected: the desktop
    /// is still restored but no size change is recorded.
    pub fn stop_resizing(&mut self, w: Xid, new_size: (u32, u32)) {
        if self.find_desktop(w) != Some(Desktop::Resizing) {
            return;
        }

        let target = self.restore_target(w);
        self.transition_desktop(w, target);
        self.gesture = None;

        if new_size.0 >= 1 && new_size.1 >= 1 {
            self.change_size(w, new_size.0, new_size.1);
        } else {
            debug!(%w, ?new_size, "rejecting degenerate size from resize gesture");
        }

        if self.is_autofocus(w) && self.is_focusable(w) {
            self.set_focus(Some(w));
        }
    }

    fn start_gesture(&mut self, w: Xid, holding: Desktop) {
        if self.gesture.is_some() {
            return;
        }
        match self.find_desktop(w) {
            Some(d) if d.is_user() || d.is_all() => (),
            _ => return,
        }

        if self.family_holds_focus(w) {
            self.set_focus(None);
        }
        self.transition_desktop(w, holding);
        self.gesture = Some(w);
    }

    // ------------------------------------------------------------------
    // Desktops

    /// Toggle a client between the current user desktop and the sticky
    /// plane. Emits exactly one desktop change and never touches focus.
    pub fn toggle_stick(&mut self, w: Xid) {
        let target = match self.find_desktop(w) {
            Some(Desktop::User(_)) => Desktop::AllDesktops,
            Some(Desktop::AllDesktops) => Desktop::User(self.current_desktop),
            _ => return,
        };

        self.transition_desktop(w, target);
    }

    /// Send a client to the next user desktop, wrapping at the end.
    pub fn client_next_desktop(&mut self, w: Xid) {
        self.client_step_desktop(w, 1);
    }

    /// Send a client to the previous user desktop, wrapping at the front.
    pub fn client_prev_desktop(&mut self, w: Xid) {
        self.client_step_desktop(w, -1);
    }

    /// Bring a client back to the current user desktop. No-op if it is
    /// already there.
    pub fn client_reset_desktop(&mut self, w: Xid) {
        match self.find_desktop(w) {
            Some(d) if d.is_user() || d.is_all() => {
                if d == Desktop::User(self.current_desktop) {
                    return;
                }
            }
            _ => return,
        }

        if self.family_holds_focus(w) {
            self.set_focus(None);
        }
        self.transition_desktop(w, Desktop::User(self.current_desktop));
    }

    fn client_step_desktop(&mut self, w: Xid, step: isize) {
        let index = match self.find_desktop(w) {
            Some(Desktop::User(i)) => i,
            Some(Desktop::AllDesktops) => self.current_desktop,
            _ => return,
        };

        let n = self.num_desktops as isize;
        let next = (index as isize + step).rem_euclid(n) as usize;
        if self.find_desktop(w) == Some(Desktop::User(next)) {
            return;
        }

        if self.family_holds_focus(w) {
            self.set_focus(None);
        }
        self.transition_desktop(w, Desktop::User(next));
    }

    /// Show the next user desktop, wrapping at the end.
    pub fn next_desktop(&mut self) {
        self.step_desktop(1);
    }

    /// Show the previous user desktop, wrapping at the front.
    pub fn prev_desktop(&mut self) {
        self.step_desktop(-1);
    }

    fn step_desktop(&mut self, step: isize) {
        if self.gesture.is_some() {
            return;
        }

        let n = self.num_desktops as isize;
        let next = (self.current_desktop as isize + step).rem_euclid(n) as usize;
        if next == self.current_desktop {
            return;
        }

        // The focused client loses focus unless it will still be visible
        // on the destination desktop.
        if let Some(f) = self.focused {
            let root = self.parents.get(&f).copied().unwrap_or(f);
            let still_visible = self
                .find_desktop(root)
                .map(|d| d.visible_on(next))
                .unwrap_or(false);
            if !still_visible {
                self.set_focus(None);
            }
        }

        let prev = Desktop::User(self.current_desktop);
        self.current_desktop = next;
        self.changes.push(Change::CurrentDesktop {
            prev,
            next: Desktop::User(next),
        });

        // Restore the desktop's remembered focus target if it can take it
        if self.focused.is_none() {
            if let Some(&w) = self.desktop_focus.get(&next) {
                if self.is_focusable(w) {
                    self.set_focus(Some(w));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Layers

    /// Raise a client one stacking layer. No-op at the top.
    pub fn up_layer(&mut self, w: Xid) {
        if let Some(l) = self.find_layer(w) {
            if l < MAX_LAYER {
                self.set_layer(w, l + 1);
            }
        }
    }

    /// Lower a client one stacking layer. No-op at the bottom.
    pub fn down_layer(&mut self, w: Xid) {
        if let Some(l) = self.find_layer(w) {
            if l > MIN_LAYER {
                self.set_layer(w, l - 1);
            }
        }
    }

    /// Put a client on a specific layer, clamped to the valid range. No-op
    /// if it is already there.
    pub fn set_layer(&mut self, w: Xid, layer: Layer) {
        let layer = layer.clamp(MIN_LAYER, MAX_LAYER);
        match self.clients.get_mut(&w) {
            Some(c) if c.layer != layer => {
                c.layer = layer;
                self.changes.push(Change::Layer { window: w, layer });
            }
            _ => (),
        }
    }

    // ------------------------------------------------------------------
    // Geometry

    /// Change a client's position/scale mode. No-op if unchanged.
    pub fn change_mode(&mut self, w: Xid, mode: CpsMode) {
        match self.clients.get_mut(&w) {
            Some(c) if c.mode != mode => {
                c.mode = mode;
                self.changes.push(Change::Mode { window: w, mode });
            }
            _ => (),
        }
    }

    /// Move a client. Emits a location change and, if the move crossed a
    /// monitor boundary, a screen change after it.
    pub fn change_location(&mut self, w: Xid, x: i32, y: i32) {
        match self.clients.get_mut(&w) {
            Some(c) if c.location != Point::new(x, y) => {
                c.location = Point::new(x, y);
                self.changes.push(Change::Location { window: w, x, y });
                self.refresh_screen_after_geometry(w);
            }
            _ => (),
        }
    }

    /// Resize a client. Degenerate sizes are rejected. Emits a size change
    /// and, if the resize crossed a monitor boundary, a screen change after
    /// it.
    pub fn change_size(&mut self, w: Xid, width: u32, height: u32) {
        if width < 1 || height < 1 {
            debug!(%w, width, height, "rejecting degenerate resize");
            return;
        }

        match self.clients.get_mut(&w) {
            Some(c) if c.size != (width, height) => {
                c.size = (width, height);
                self.changes.push(Change::Size {
                    window: w,
                    w: width,
                    h: height,
                });
                self.refresh_screen_after_geometry(w);
            }
            _ => (),
        }
    }

    fn refresh_screen_after_geometry(&mut self, w: Xid) {
        let (mid, current) = match self.clients.get(&w) {
            Some(c) => (client_box(c).midpoint(), c.screen),
            None => return,
        };

        if let Some(next) = self.screens.containing(mid) {
            if next != current {
                self.rehome(w, next);
            }
        }
    }

    fn rehome(&mut self, w: Xid, bounds: Rect) {
        if let Some(c) = self.clients.get_mut(&w) {
            c.screen = bounds;
            self.changes.push(Change::Screen { window: w, bounds });
        }
    }

    // ------------------------------------------------------------------
    // Screens

    /// Send a client to the neighbouring monitor in the given direction.
    /// No-op when there is no neighbour.
    pub fn send_to_relative_screen(&mut self, w: Xid, dir: Direction) {
        let current = match self.get_screen(w) {
            Some(s) => s,
            None => return,
        };

        if let Some(next) = self.screens.neighbor(current, dir) {
            if next != current {
                self.rehome(w, next);
            }
        }
    }

    /// Send a client to the monitor with exactly the given bounds. No-op if
    /// the bounds match no monitor or the client is already there.
    pub fn send_to_screen_box(&mut self, w: Xid, bounds: Rect) {
        let current = match self.get_screen(w) {
            Some(s) => s,
            None => return,
        };

        if self.screens.is_screen(&bounds) && bounds != current {
            self.rehome(w, bounds);
        }
    }

    /// Rebuild the screen graph after a monitor reconfiguration and re-home
    /// any client whose bounding box no longer intersects any monitor to the
    /// closest one. Clients still touching a monitor are left where they
    /// are, and clients parked at the `(-1, -1)` sentinel are never
    /// reassigned.
    pub fn update_screens(&mut self, boxes: Vec<Rect>) {
        self.screens.rebuild(boxes);

        for w in self.order.clone() {
            let c = &self.clients[&w];
            if c.location == Point::new(-1, -1) {
                continue;
            }

            let bbox = client_box(c);
            if self.screens.boxes().iter().any(|b| b.intersects(&bbox)) {
                continue;
            }

            if let Some(home) = self.screens.closest_to(&bbox) {
                if home != c.screen {
                    self.rehome(w, home);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Corner packing

    /// Mark a client as packed against a corner of the root screen with the
    /// given priority. Takes effect at the next repack of that corner.
    pub fn pack_client(&mut self, w: Xid, corner: Corner, priority: u64) {
        if let Some(c) = self.clients.get_mut(&w) {
            c.packed = Some((corner, priority));
        }
    }

    /// Lay out every client packed against the given corner, in ascending
    /// priority order, flush against the corner of the root screen. Emits a
    /// location change for each client that actually moves.
    pub fn repack_corner(&mut self, corner: Corner) {
        let root = match self.screens.root() {
            Some(r) => r,
            None => {
                error!("no monitors available to pack against");
                return;
            }
        };

        let mut packed: Vec<(u64, Xid)> = self
            .order
            .iter()
            .filter_map(|&w| match self.clients[&w].packed {
                Some((c, p)) if c == corner => Some((p, w)),
                _ => None,
            })
            .collect();
        packed.sort_by_key(|&(p, _)| p);

        let mut offset = 0i32;
        for (_, w) in packed {
            let (cw, ch) = self.clients[&w].size;
            let (x, y) = match corner {
                Corner::NorthWest => (root.x + offset, root.y),
                Corner::NorthEast => (root.right() - offset - cw as i32, root.y),
                Corner::SouthWest => (root.x + offset, root.bottom() - ch as i32),
                Corner::SouthEast => (
                    root.right() - offset - cw as i32,
                    root.bottom() - ch as i32,
                ),
            };

            self.change_location(w, x, y);
            offset += cw as i32;
        }
    }

    // ------------------------------------------------------------------
    // Children

    /// Attach a transient child to a parent client. The child joins the
    /// focus cycle directly behind its parent's block, and takes the focus
    /// if the parent is focusable and marked for automatic focus.
    pub fn add_child(&mut self, parent: Xid, child: Xid) {
        if !self.is_client(parent) || self.is_client(child) || self.is_child(child) {
            debug!(%parent, %child, "ignoring add_child with invalid parent or child");
            return;
        }

        let anchor = self
            .children
            .get(&parent)
            .and_then(|cs| cs.last().copied())
            .unwrap_or(parent);
        self.cycle.insert_after(child, anchor);
        self.children.entry(parent).or_default().push(child);
        self.parents.insert(child, parent);

        self.changes.push(Change::ChildAdd { parent, child });

        if self.is_autofocus(parent) && self.is_focusable(parent) {
            self.set_focus(Some(child));
        }
    }

    /// Detach a transient child. If it held the focus, focus moves to the
    /// parent (when `refocus_parent`) or is dropped.
    pub fn remove_child(&mut self, child: Xid, refocus_parent: bool) {
        let parent = match self.parents.get(&child) {
            Some(&p) => p,
            None => return,
        };

        if self.focused == Some(child) {
            let next = if refocus_parent { Some(parent) } else { None };
            self.set_focus(next);
        }

        self.parents.remove(&child);
        if let Some(cs) = self.children.get_mut(&parent) {
            cs.retain(|&c| c != child);
        }
        self.cycle.remove(child);

        self.changes.push(Change::ChildRemove { parent, child });
    }

    // ------------------------------------------------------------------
    // Mapping

    /// Record that a client unmapped itself. It keeps its slot in the model
    /// but is unfocusable until it maps again.
    pub fn unmap_client(&mut self, w: Xid) {
        match self.clients.get_mut(&w) {
            Some(c) if c.mapped => c.mapped = false,
            _ => return,
        }

        if self.family_holds_focus(w) {
            self.set_focus(None);
        }
        self.changes.push(Change::Unmap { window: w });
    }

    /// Record that a previously unmapped client mapped itself again: it
    /// takes focus if marked for automatic focus and its stacking intent is
    /// re-established.
    pub fn remap_client(&mut self, w: Xid) {
        let layer = match self.clients.get_mut(&w) {
            Some(c) if !c.mapped => {
                c.mapped = true;
                c.layer
            }
            _ => return,
        };

        if self.is_autofocus(w) && self.is_focusable(w) {
            self.set_focus(Some(w));
        }
        self.changes.push(Change::Layer { window: w, layer });
    }

    // ------------------------------------------------------------------
    // Focus

    /// Give the input focus to a window (client or child) if it can take
    /// it. Emits a focus change only if the focus actually moves.
    pub fn focus(&mut self, w: Xid) {
        if self.is_focusable(w) && self.focused != Some(w) {
            self.set_focus(Some(w));
        }
    }

    /// Park the focus on the root window.
    pub fn unfocus(&mut self) {
        self.set_focus(None);
    }

    /// Park the focus on the root window iff `w` currently holds it.
    pub fn unfocus_if_focused(&mut self, w: Xid) {
        if self.focused == Some(w) {
            self.set_focus(None);
        }
    }

    /// Advance the focus cycle to the next focusable window.
    pub fn cycle_focus_forward(&mut self) {
        if let Some(w) = self.cycle.forward(|w| self.is_focusable(w)) {
            if self.focused != Some(w) {
                self.set_focus(Some(w));
            }
        }
    }

    /// Step the focus cycle back to the previous focusable window.
    pub fn cycle_focus_backward(&mut self) {
        if let Some(w) = self.cycle.backward(|w| self.is_focusable(w)) {
            if self.focused != Some(w) {
                self.set_focus(Some(w));
            }
        }
    }

    fn set_focus(&mut self, next: Option<Xid>) {
        if self.focused == next {
            return;
        }

        let prev = self.focused;
        self.focused = next;

        if let Some(w) = next {
            self.cycle.set_current(w);
            self.desktop_focus.insert(self.current_desktop, w);
        }

        self.changes.push(Change::Focus { prev, next });
    }

    fn family_holds_focus(&self, w: Xid) -> bool {
        match self.focused {
            Some(f) if f == w => true,
            Some(f) => self.parents.get(&f) == Some(&w),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Internals

    fn transition_desktop(&mut self, w: Xid, next: Desktop) {
        if let Some(c) = self.clients.get_mut(&w) {
            let prev = c.desktop;
            if prev == next {
                return;
            }
            c.prev_desktop = Some(prev);
            c.desktop = next;
            self.changes.push(Change::ClientDesktop {
                window: w,
                prev: Some(prev),
                next,
            });
        }
    }

    // Where a client held on Icon / Moving / Resizing goes when released:
    // back to the sticky plane if it was sticky when it entered, else the
    // current user desktop.
    fn restore_target(&self, w: Xid) -> Desktop {
        match self.clients.get(&w).and_then(|c| c.prev_desktop) {
            Some(Desktop::AllDesktops) => Desktop::AllDesktops,
            _ => Desktop::User(self.current_desktop),
        }
    }

    // ------------------------------------------------------------------
    // Dump

    /// Write a textual dump of the screen graph and the client list:
    /// screens first, one `box` line per monitor, then one `client` line
    /// per managed window.
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for b in self.screens.boxes() {
            writeln!(out, "box {b}")?;
        }

        for w in &self.order {
            let c = &self.clients[w];
            writeln!(
                out,
                "client {} {} {} {} {} {} {} {}",
                w, c.desktop, c.layer, c.location.x, c.location.y, c.size.0, c.size.1, c.mode
            )?;
        }

        Ok(())
    }
}

fn client_box(c: &Client) -> Rect {
    Rect::new(c.location.x, c.location.y, c.size.0, c.size.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pure::geometry::{Corner, Direction};
    use simple_test_case::test_case;

    const A: Xid = Xid(1);
    const B: Xid = Xid(2);
    const C: Xid = Xid(3);

    const N_DESKTOPS: usize = 5;

    fn test_model() -> ClientModel {
        ClientModel::new(N_DESKTOPS, vec![Rect::new(0, 0, 1000, 1000)])
    }

    fn add(model: &mut ClientModel, w: Xid) {
        model.add_client(
            w,
            InitialVisibility::Visible,
            Point::new(1, 1),
            (1, 1),
            true,
        );
    }

    fn add_flushed(model: &mut ClientModel, w: Xid) {
        add(model, w);
        model.flush_changes();
    }

    #[test]
    fn creation_event_order() {
        let mut model = test_model();
        add(&mut model, A);

        assert!(model.is_client(A));
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::ClientDesktop {
                    window: A,
                    prev: None,
                    next: Desktop::User(0)
                },
                Change::Layer {
                    window: A,
                    layer: DEF_LAYER
                },
                Change::Focus {
                    prev: None,
                    next: Some(A)
                },
            ]
        );
        assert_eq!(model.get_focused(), Some(A));

        model.remove_client(A);
        assert!(!model.is_client(A));
    }

    #[test]
    fn creation_without_autofocus_emits_no_focus_change() {
        let mut model = test_model();
        model.add_client(
            A,
            InitialVisibility::Visible,
            Point::new(1, 1),
            (1, 1),
            false,
        );

        assert_eq!(
            model.drain_changes(),
            vec![
                Change::ClientDesktop {
                    window: A,
                    prev: None,
                    next: Desktop::User(0)
                },
                Change::Layer {
                    window: A,
                    layer: DEF_LAYER
                },
            ]
        );
        assert_eq!(model.get_focused(), None);
    }

    #[test]
    fn visibility_follows_every_state_dimension() {
        let mut model = test_model();
        add(&mut model, A);
        assert!(model.is_visible(A));

        model.start_moving(A);
        assert!(!model.is_visible(A));
        model.stop_moving(A, Point::new(2, 2));
        assert!(model.is_visible(A));

        model.start_resizing(A);
        assert!(!model.is_visible(A));
        model.stop_resizing(A, (2, 2));
        assert!(model.is_visible(A));

        model.iconify(A);
        assert!(!model.is_visible(A));
        model.deiconify(A);
        assert!(model.is_visible(A));

        model.client_next_desktop(A);
        assert!(!model.is_visible(A));
        model.client_prev_desktop(A);
        assert!(model.is_visible(A));

        model.next_desktop();
        assert!(!model.is_visible(A));
        model.prev_desktop();
        assert!(model.is_visible(A));

        model.toggle_stick(A);
        model.next_desktop();
        assert!(model.is_visible(A));
        model.prev_desktop();
        assert!(model.is_visible(A));

        model.toggle_stick(A);
        model.next_desktop();
        assert!(!model.is_visible(A));
        model.prev_desktop();
        assert!(model.is_visible(A));
    }

    #[test]
    fn finders_report_initial_state() {
        let mut model = test_model();
        add(&mut model, A);

        assert_eq!(model.find_desktop(A), Some(Desktop::User(0)));
        assert_eq!(model.find_layer(A), Some(DEF_LAYER));
        assert_eq!(model.get_mode(A), Some(CpsMode::Floating));
    }

    #[test]
    fn getters_track_desktops_and_layer_order() {
        let mut model = test_model();
        add(&mut model, A);
        add(&mut model, B);

        assert_eq!(model.get_clients_of(Desktop::User(0)), vec![A, B]);
        assert_eq!(model.get_visible_clients(), vec![A, B]);

        model.down_layer(B);
        assert_eq!(model.get_visible_in_layer_order(), vec![B, A]);

        model.up_layer(B);
        model.up_layer(B);
        assert_eq!(model.get_visible_in_layer_order(), vec![A, B]);

        model.client_next_desktop(B);
        assert_eq!(model.get_clients_of(Desktop::User(0)), vec![A]);
        assert_eq!(model.get_clients_of(Desktop::User(1)), vec![B]);
        assert_eq!(model.get_visible_clients(), vec![A]);
        assert_eq!(model.get_visible_in_layer_order(), vec![A]);

        model.next_desktop();
        assert_eq!(model.get_visible_clients(), vec![B]);
        assert_eq!(model.get_visible_in_layer_order(), vec![B]);
    }

    #[test]
    fn layer_changes_emit_one_event_each() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.up_layer(A);
        assert_eq!(
            model.drain_changes(),
            vec![Change::Layer {
                window: A,
                layer: DEF_LAYER + 1
            }]
        );

        model.down_layer(A);
        assert_eq!(
            model.drain_changes(),
            vec![Change::Layer {
                window: A,
                layer: DEF_LAYER
            }]
        );

        model.set_layer(A, MIN_LAYER);
        assert_eq!(
            model.drain_changes(),
            vec![Change::Layer {
                window: A,
                layer: MIN_LAYER
            }]
        );

        // same layer again: no event
        model.set_layer(A, MIN_LAYER);
        assert!(!model.has_changes());
    }

    #[test]
    fn layer_boundaries_are_silent_no_ops() {
        let mut model = test_model();
        add(&mut model, A);

        model.set_layer(A, MIN_LAYER);
        model.flush_changes();
        model.down_layer(A);
        assert!(!model.has_changes());

        model.set_layer(A, MAX_LAYER);
        model.flush_changes();
        model.up_layer(A);
        assert!(!model.has_changes());
    }

    #[test]
    fn client_desktop_changes_wrap_and_drop_focus() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        // S2: focus is dropped before the desktop change
        model.client_next_desktop(A);
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: Some(A),
                    next: None
                },
                Change::ClientDesktop {
                    window: A,
                    prev: Some(Desktop::User(0)),
                    next: Desktop::User(1)
                },
            ]
        );
        assert_eq!(model.get_focused(), None);

        model.client_prev_desktop(A);
        assert_eq!(
            model.drain_changes(),
            vec![Change::ClientDesktop {
                window: A,
                prev: Some(Desktop::User(1)),
                next: Desktop::User(0)
            }]
        );

        model.client_prev_desktop(A);
        assert_eq!(
            model.drain_changes(),
            vec![Change::ClientDesktop {
                window: A,
                prev: Some(Desktop::User(0)),
                next: Desktop::User(N_DESKTOPS - 1)
            }]
        );

        model.client_next_desktop(A);
        assert_eq!(
            model.drain_changes(),
            vec![Change::ClientDesktop {
                window: A,
                prev: Some(Desktop::User(N_DESKTOPS - 1)),
                next: Desktop::User(0)
            }]
        );
    }

    #[test]
    fn desktop_changes_are_rejected_for_held_clients() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.iconify(A);
        model.flush_changes();
        model.client_next_desktop(A);
        model.client_prev_desktop(A);
        assert!(!model.has_changes());
        model.deiconify(A);
        model.flush_changes();

        model.start_moving(A);
        model.flush_changes();
        model.client_next_desktop(A);
        model.client_prev_desktop(A);
        assert!(!model.has_changes());
        model.stop_moving(A, Point::new(1, 1));
        model.flush_changes();

        model.start_resizing(A);
        model.flush_changes();
        model.client_next_desktop(A);
        model.client_prev_desktop(A);
        assert!(!model.has_changes());
        model.stop_resizing(A, (1, 1));
    }

    #[test]
    fn current_desktop_wraps_both_ways() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.next_desktop();
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: Some(A),
                    next: None
                },
                Change::CurrentDesktop {
                    prev: Desktop::User(0),
                    next: Desktop::User(1)
                },
            ]
        );

        // S3: stepping back restores the remembered focus target
        model.prev_desktop();
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::CurrentDesktop {
                    prev: Desktop::User(1),
                    next: Desktop::User(0)
                },
                Change::Focus {
                    prev: None,
                    next: Some(A)
                },
            ]
        );

        model.prev_desktop();
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: Some(A),
                    next: None
                },
                Change::CurrentDesktop {
                    prev: Desktop::User(0),
                    next: Desktop::User(N_DESKTOPS - 1)
                },
            ]
        );

        model.next_desktop();
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::CurrentDesktop {
                    prev: Desktop::User(N_DESKTOPS - 1),
                    next: Desktop::User(0)
                },
                Change::Focus {
                    prev: None,
                    next: Some(A)
                },
            ]
        );
    }

    #[test]
    fn desktop_switch_is_blocked_during_a_gesture() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.start_moving(A);
        model.flush_changes();

        model.next_desktop();
        model.prev_desktop();
        assert!(!model.has_changes());
        assert_eq!(model.current_desktop(), Desktop::User(0));
    }

    #[test]
    fn only_one_gesture_at_a_time() {
        let mut model = test_model();
        add_flushed(&mut model, A);
        add_flushed(&mut model, B);

        model.start_moving(A);
        model.flush_changes();

        model.start_resizing(B);
        model.start_moving(B);
        assert!(!model.has_changes());

        model.stop_moving(A, Point::new(5, 5));
        model.flush_changes();
        model.start_resizing(B);
        assert!(model.has_changes());
    }

    #[test]
    fn sticky_clients_keep_focus_across_desktop_switches() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.toggle_stick(A);
        assert_eq!(
            model.drain_changes(),
            vec![Change::ClientDesktop {
                window: A,
                prev: Some(Desktop::User(0)),
                next: Desktop::AllDesktops
            }]
        );

        model.next_desktop();
        assert_eq!(
            model.drain_changes(),
            vec![Change::CurrentDesktop {
                prev: Desktop::User(0),
                next: Desktop::User(1)
            }]
        );
        assert_eq!(model.get_focused(), Some(A));
    }

    #[test]
    fn toggle_stick_is_an_involution_and_never_touches_focus() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.toggle_stick(A);
        model.toggle_stick(A);

        let changes = model.drain_changes();
        assert_eq!(
            changes,
            vec![
                Change::ClientDesktop {
                    window: A,
                    prev: Some(Desktop::User(0)),
                    next: Desktop::AllDesktops
                },
                Change::ClientDesktop {
                    window: A,
                    prev: Some(Desktop::AllDesktops),
                    next: Desktop::User(0)
                },
            ]
        );
        assert_eq!(model.find_desktop(A), Some(Desktop::User(0)));
        assert_eq!(model.get_focused(), Some(A));
    }

    #[test]
    fn iconify_round_trip_across_a_desktop_switch() {
        // S4
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.iconify(A);
        model.next_desktop();
        model.deiconify(A);

        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: Some(A),
                    next: None
                },
                Change::ClientDesktop {
                    window: A,
                    prev: Some(Desktop::User(0)),
                    next: Desktop::Icon
                },
                Change::CurrentDesktop {
                    prev: Desktop::User(0),
                    next: Desktop::User(1)
                },
                Change::ClientDesktop {
                    window: A,
                    prev: Some(Desktop::Icon),
                    next: Desktop::User(1)
                },
                Change::Focus {
                    prev: None,
                    next: Some(A)
                },
            ]
        );
    }

    #[test]
    fn sticky_clients_return_to_the_sticky_plane_on_deiconify() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.toggle_stick(A);
        model.iconify(A);
        model.next_desktop();
        model.deiconify(A);

        assert_eq!(model.find_desktop(A), Some(Desktop::AllDesktops));
    }

    #[test]
    fn invalid_resize_restores_desktop_without_a_size_change() {
        // S5
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.start_resizing(A);
        model.stop_resizing(A, (0, 0));

        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: Some(A),
                    next: None
                },
                Change::ClientDesktop {
                    window: A,
                    prev: Some(Desktop::User(0)),
                    next: Desktop::Resizing
                },
                Change::ClientDesktop {
                    window: A,
                    prev: Some(Desktop::Resizing),
                    next: Desktop::User(0)
                },
                Change::Focus {
                    prev: None,
                    next: Some(A)
                },
            ]
        );
    }

    #[test]
    fn stop_moving_applies_the_placeholder_location() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.start_moving(A);
        model.stop_moving(A, Point::new(40, 50));

        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: Some(A),
                    next: None
                },
                Change::ClientDesktop {
                    window: A,
                    prev: Some(Desktop::User(0)),
                    next: Desktop::Moving
                },
                Change::ClientDesktop {
                    window: A,
                    prev: Some(Desktop::Moving),
                    next: Desktop::User(0)
                },
                Change::Location {
                    window: A,
                    x: 40,
                    y: 50
                },
                Change::Focus {
                    prev: None,
                    next: Some(A)
                },
            ]
        );
        assert_eq!(model.get_location(A), Some(Point::new(40, 50)));
    }

    #[test]
    fn pack_two_clients_into_the_north_west_corner() {
        // S6
        let mut model = test_model();
        model.add_client(
            A,
            InitialVisibility::Visible,
            Point::new(1, 1),
            (10, 10),
            false,
        );
        model.add_client(
            B,
            InitialVisibility::Visible,
            Point::new(1, 1),
            (30, 10),
            false,
        );
        model.flush_changes();

        model.pack_client(A, Corner::NorthWest, 1);
        model.pack_client(B, Corner::NorthWest, 2);
        assert!(!model.has_changes());

        model.repack_corner(Corner::NorthWest);
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Location {
                    window: A,
                    x: 0,
                    y: 0
                },
                Change::Location {
                    window: B,
                    x: 10,
                    y: 0
                },
            ]
        );
    }

    #[test_case(Corner::NorthEast, (960, 0), (920, 0); "north east")]
    #[test_case(Corner::SouthWest, (0, 980), (40, 980); "south west")]
    #[test_case(Corner::SouthEast, (960, 980), (920, 980); "south east")]
    #[test]
    fn packing_anchors_against_the_requested_corner(
        corner: Corner,
        first: (i32, i32),
        second: (i32, i32),
    ) {
        let mut model = test_model();
        for w in [A, B] {
            model.add_client(
                w,
                InitialVisibility::Visible,
                Point::new(1, 1),
                (40, 20),
                false,
            );
            model.pack_client(w, corner, u64::from(w.raw()));
        }
        model.flush_changes();

        model.repack_corner(corner);

        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Location {
                    window: A,
                    x: first.0,
                    y: first.1
                },
                Change::Location {
                    window: B,
                    x: second.0,
                    y: second.1
                },
            ]
        );
    }

    #[test]
    fn children_join_the_family_and_take_focus() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.add_child(A, C);
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::ChildAdd {
                    parent: A,
                    child: C
                },
                Change::Focus {
                    prev: Some(A),
                    next: Some(C)
                },
            ]
        );
        assert!(model.is_child(C));
        assert_eq!(model.get_parent_of(C), Some(A));

        model.remove_child(C, true);
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: Some(C),
                    next: Some(A)
                },
                Change::ChildRemove {
                    parent: A,
                    child: C
                },
            ]
        );
        assert!(!model.is_child(C));
    }

    #[test]
    fn duplicate_or_orphan_children_are_rejected() {
        let mut model = test_model();
        add_flushed(&mut model, A);
        add_flushed(&mut model, B);

        model.add_child(C, Xid(99)); // unknown parent
        assert!(!model.has_changes());

        model.add_child(A, C);
        model.flush_changes();
        model.add_child(B, C); // already someone's child
        assert!(!model.has_changes());
        assert_eq!(model.get_parent_of(C), Some(A));
    }

    #[test]
    fn removing_a_client_tears_down_its_family_in_order() {
        let mut model = test_model();
        add_flushed(&mut model, A);
        model.add_child(A, B);
        model.add_child(A, C);
        model.flush_changes();

        // B took focus when added, then C did
        assert_eq!(model.get_focused(), Some(C));

        model.remove_client(A);
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: Some(C),
                    next: None
                },
                Change::ChildRemove {
                    parent: A,
                    child: B
                },
                Change::ChildRemove {
                    parent: A,
                    child: C
                },
                Change::Destroy {
                    window: A,
                    last_desktop: Desktop::User(0),
                    last_layer: DEF_LAYER
                },
            ]
        );
        assert!(!model.is_client(A));
        assert!(!model.is_child(B));
        assert!(!model.is_child(C));
    }

    #[test]
    fn unmap_and_remap_round_trip() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.unmap_client(A);
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: Some(A),
                    next: None
                },
                Change::Unmap { window: A },
            ]
        );
        assert!(!model.is_visible(A));
        assert!(!model.is_focusable(A));

        model.remap_client(A);
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Focus {
                    prev: None,
                    next: Some(A)
                },
                Change::Layer {
                    window: A,
                    layer: DEF_LAYER
                },
            ]
        );
        assert!(model.is_visible(A));
    }

    #[test]
    fn focus_cycle_walks_parents_then_children() {
        let mut model = test_model();
        add_flushed(&mut model, A);
        add_flushed(&mut model, B);
        model.add_child(A, C);
        model.flush_changes();

        // C holds focus after add_child
        model.cycle_focus_forward();
        assert_eq!(model.get_focused(), Some(B));

        model.cycle_focus_forward();
        assert_eq!(model.get_focused(), Some(A));

        model.cycle_focus_forward();
        assert_eq!(model.get_focused(), Some(C));

        model.cycle_focus_backward();
        assert_eq!(model.get_focused(), Some(A));
    }

    #[test]
    fn cycling_skips_unfocusable_windows() {
        let mut model = test_model();
        add_flushed(&mut model, A);
        add_flushed(&mut model, B);
        add_flushed(&mut model, C);

        model.iconify(B);
        model.flush_changes();
        model.focus(A);

        model.cycle_focus_forward();
        assert_eq!(model.get_focused(), Some(C));
    }

    #[test]
    fn explicit_focus_of_an_invisible_window_is_rejected() {
        let mut model = test_model();
        add_flushed(&mut model, A);
        model.client_next_desktop(A);
        model.flush_changes();

        model.focus(A);
        assert!(!model.has_changes());
        assert_eq!(model.get_focused(), None);
    }

    #[test]
    fn crossing_a_monitor_boundary_emits_a_screen_change() {
        let screens = vec![Rect::new(0, 0, 1000, 1000), Rect::new(1000, 0, 1000, 1000)];
        let mut model = ClientModel::new(N_DESKTOPS, screens);
        model.add_client(
            A,
            InitialVisibility::Visible,
            Point::new(10, 10),
            (100, 100),
            false,
        );
        model.flush_changes();

        model.change_location(A, 1200, 10);
        assert_eq!(
            model.drain_changes(),
            vec![
                Change::Location {
                    window: A,
                    x: 1200,
                    y: 10
                },
                Change::Screen {
                    window: A,
                    bounds: Rect::new(1000, 0, 1000, 1000)
                },
            ]
        );

        // moving within the same monitor emits no screen change
        model.change_location(A, 1300, 10);
        assert_eq!(
            model.drain_changes(),
            vec![Change::Location {
                window: A,
                x: 1300,
                y: 10
            }]
        );
    }

    #[test_case(Direction::Right, Some(Rect::new(1000, 0, 1000, 1000)); "to the right neighbour")]
    #[test_case(Direction::Left, None; "no neighbour to the left")]
    #[test]
    fn sending_to_relative_screen(dir: Direction, expected: Option<Rect>) {
        let screens = vec![Rect::new(0, 0, 1000, 1000), Rect::new(1000, 0, 1000, 1000)];
        let mut model = ClientModel::new(N_DESKTOPS, screens);
        model.add_client(
            A,
            InitialVisibility::Visible,
            Point::new(10, 10),
            (100, 100),
            false,
        );
        model.flush_changes();

        model.send_to_relative_screen(A, dir);

        match expected {
            Some(bounds) => {
                assert_eq!(
                    model.drain_changes(),
                    vec![Change::Screen { window: A, bounds }]
                );
                assert_eq!(model.get_screen(A), Some(bounds));
            }
            None => assert!(!model.has_changes()),
        }
    }

    #[test]
    fn update_screens_rehomes_stranded_clients_but_not_parked_ones() {
        let mut model = ClientModel::new(N_DESKTOPS, vec![Rect::new(0, 0, 1000, 1000)]);
        model.add_client(
            A,
            InitialVisibility::Visible,
            Point::new(1500, 10),
            (100, 100),
            false,
        );
        model.add_client(
            B,
            InitialVisibility::Visible,
            Point::new(-1, -1),
            (100, 100),
            false,
        );
        model.flush_changes();

        let new_screens = vec![Rect::new(2000, 0, 1000, 1000)];
        model.update_screens(new_screens.clone());

        assert_eq!(
            model.drain_changes(),
            vec![Change::Screen {
                window: A,
                bounds: new_screens[0]
            }]
        );
        assert_eq!(model.get_screen(A), Some(new_screens[0]));
    }

    #[test]
    fn update_screens_leaves_clients_that_still_touch_a_monitor() {
        let mut model = ClientModel::new(N_DESKTOPS, vec![Rect::new(0, 0, 1000, 1000)]);
        model.add_client(
            A,
            InitialVisibility::Visible,
            Point::new(10, 10),
            (100, 100),
            false,
        );
        model.flush_changes();

        // a new overlapping monitor appears first in the list, but the
        // client never left its original monitor
        model.update_screens(vec![Rect::new(5, 5, 500, 500), Rect::new(0, 0, 1000, 1000)]);

        assert!(!model.has_changes());
        assert_eq!(model.get_screen(A), Some(Rect::new(0, 0, 1000, 1000)));
    }

    #[test]
    fn change_mode_emits_once_and_is_idempotent() {
        let mut model = test_model();
        add_flushed(&mut model, A);

        model.change_mode(A, CpsMode::Max);
        assert_eq!(
            model.drain_changes(),
            vec![Change::Mode {
                window: A,
                mode: CpsMode::Max
            }]
        );

        model.change_mode(A, CpsMode::Max);
        assert!(!model.has_changes());
    }

    #[test]
    fn hidden_clients_do_not_take_focus_at_creation() {
        let mut model = test_model();
        model.add_client(A, InitialVisibility::Hidden, Point::new(1, 1), (1, 1), true);

        assert_eq!(
            model.drain_changes(),
            vec![
                Change::ClientDesktop {
                    window: A,
                    prev: None,
                    next: Desktop::User(0)
                },
                Change::Layer {
                    window: A,
                    layer: DEF_LAYER
                },
            ]
        );
        assert!(!model.is_mapped(A));
        assert_eq!(model.get_focused(), None);
    }

    #[test]
    fn dump_lists_screens_then_clients() {
        let mut model = test_model();
        model.add_client(
            A,
            InitialVisibility::Visible,
            Point::new(5, 6),
            (70, 80),
            false,
        );
        model.change_mode(A, CpsMode::SplitLeft);

        let mut out = Vec::new();
        model.dump(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "box 0 0 1000 1000\nclient 1 user(0) 5 5 6 70 80 split-left\n"
        );
    }
}
