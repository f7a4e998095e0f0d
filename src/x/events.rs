//! Translation of display-server events into client model calls.
//!
//! The adapter owns the resolved key/mouse binding table and the "am I
//! done" flag. It never issues model-visible side effects itself beyond
//! the few direct window operations the protocol demands (mapping newly
//! managed windows, honoring configure requests for unmanaged ones);
//! everything else goes through the model so the dispatcher stays the
//! single writer of managed-window state.
use crate::{
    bindings::{Action, BindingSet},
    config::WmConfig,
    pure::{
        geometry::{Direction, Point},
        model::{ClientModel, CpsMode, InitialVisibility, MAX_LAYER, MIN_LAYER},
    },
    x::{MoveResizeKind, XConn, XEvent, XModel, EXPECT_MAP, EXPECT_UNMAP},
    Result, Xid,
};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// The bridge from raw [XEvent]s to [ClientModel] mutations.
#[derive(Debug)]
pub struct EventAdapter {
    bindings: BindingSet,
    border_width: u32,
    shell: String,
    done: bool,
}

impl EventAdapter {
    /// Build an adapter for the given config.
    pub fn new(config: &WmConfig) -> Self {
        Self {
            bindings: BindingSet::from_config(config),
            border_width: config.border_width,
            shell: config.shell.clone(),
            done: false,
        }
    }

    /// Install the hotkey and mouse grabs for every configured binding.
    pub fn grab_inputs<X: XConn>(&self, x: &X) -> Result<()> {
        for (binding, _) in self.bindings.bindings() {
            x.grab_key(binding.keysym, binding.modifiers)?;
        }

        for button in [
            self.bindings.move_button,
            self.bindings.resize_button,
            self.bindings.launch_button,
        ] {
            x.grab_button(button, self.bindings.modifier)?;
        }

        Ok(())
    }

    /// Adopt the windows that already exist at startup.
    pub fn adopt_existing<X: XConn>(&self, x: &X, model: &mut ClientModel) -> Result<()> {
        for w in x.existing_windows()? {
            if w == x.root() {
                continue;
            }
            self.manage(x, model, w)?;
        }

        Ok(())
    }

    /// Wait for the next event and feed it through the model. Returns false
    /// once the user has asked the window manager to exit.
    pub fn step<X: XConn>(
        &mut self,
        x: &X,
        model: &mut ClientModel,
        xmodel: &mut XModel,
    ) -> Result<bool> {
        let event = x.next_event()?;
        self.handle_event(x, model, xmodel, event)?;

        Ok(!self.done)
    }

    /// Feed a single event through the model.
    pub fn handle_event<X: XConn>(
        &mut self,
        x: &X,
        model: &mut ClientModel,
        xmodel: &mut XModel,
        event: XEvent,
    ) -> Result<()> {
        match event {
            XEvent::KeyPress { keysym, modifiers } => {
                match self.bindings.action_for(keysym, modifiers) {
                    Some(action) => self.run_action(x, model, action)?,
                    None => debug!(keysym, modifiers, "key press with no bound action"),
                }
            }

            XEvent::ButtonPress {
                window,
                button,
                modifiers,
            } => self.handle_button_press(model, xmodel, window, button, modifiers),

            XEvent::ButtonRelease { button } => {
                if let Some(mr) = xmodel.move_resize() {
                    let ends_gesture = match mr.kind {
                        MoveResizeKind::Move => button == self.bindings.move_button,
                        MoveResizeKind::Resize => button == self.bindings.resize_button,
                    };
                    if ends_gesture {
                        let geom = x.get_geometry(mr.placeholder)?;
                        match mr.kind {
                            MoveResizeKind::Move => {
                                model.stop_moving(mr.client, Point::new(geom.x, geom.y))
                            }
                            MoveResizeKind::Resize => {
                                model.stop_resizing(mr.client, (geom.w, geom.h))
                            }
                        }
                    }
                }
            }

            XEvent::Motion { point } => {
                if let Some(mr) = xmodel.move_resize() {
                    let (dx, dy) = xmodel.update_pointer(point.x, point.y);
                    if (dx, dy) == (0, 0) {
                        return Ok(());
                    }

                    let geom = x.get_geometry(mr.placeholder)?;
                    match mr.kind {
                        MoveResizeKind::Move => {
                            x.move_window(mr.placeholder, geom.x + dx, geom.y + dy)?
                        }
                        MoveResizeKind::Resize => {
                            let w = (geom.w as i32 + dx).max(1) as u32;
                            let h = (geom.h as i32 + dy).max(1) as u32;
                            x.resize_window(mr.placeholder, w, h)?
                        }
                    }
                }
            }

            XEvent::MapRequest { window } => {
                if model.is_client(window) {
                    // a previously unmapped client coming back
                    xmodel.set_effect(window, EXPECT_MAP);
                    x.map(window)?;
                    model.remap_client(window);
                } else if model.is_child(window) {
                    x.map(window)?;
                } else {
                    self.manage(x, model, window)?;
                }
            }

            XEvent::MapNotify { window } => {
                if xmodel.has_effect(window, EXPECT_MAP) {
                    xmodel.clear_effect(window, EXPECT_MAP);
                } else if model.is_client(window) {
                    model.remap_client(window);
                }
            }

            XEvent::UnmapNotify { window } => {
                if xmodel.has_effect(window, EXPECT_UNMAP) {
                    xmodel.clear_effect(window, EXPECT_UNMAP);
                } else if model.is_client(window) {
                    model.unmap_client(window);
                } else if model.is_child(window) {
                    model.remove_child(window, true);
                }
            }

            XEvent::DestroyNotify { window } => {
                xmodel.remove_all_effects(window);
                if model.is_client(window) {
                    model.remove_client(window);
                } else if model.is_child(window) {
                    model.remove_child(window, true);
                }
            }

            XEvent::ConfigureRequest { window, rect } => {
                if model.is_client(window) {
                    // managed floating clients negotiate through the model;
                    // tiled clients have their geometry managed for them
                    if model.get_mode(window) == Some(CpsMode::Floating) {
                        model.change_location(window, rect.x, rect.y);
                        model.change_size(window, rect.w, rect.h);
                    }
                } else {
                    x.move_window(window, rect.x, rect.y)?;
                    x.resize_window(window, rect.w, rect.h)?;
                }
            }

            XEvent::Expose { window } => {
                if let Some(client) = xmodel.client_for_icon_window(window) {
                    if let Some(icon) = xmodel.icon_for_client(client) {
                        let title = x.window_title(client).unwrap_or_default();
                        x.draw_icon(icon.window, icon.gc, &title)?;
                    }
                }
            }

            XEvent::MonitorsChanged => {
                let boxes = x.monitors()?;
                info!(?boxes, "monitor layout changed");
                model.update_screens(boxes);
            }

            XEvent::Ignored => (),
        }

        Ok(())
    }

    fn handle_button_press(
        &mut self,
        model: &mut ClientModel,
        xmodel: &mut XModel,
        window: Xid,
        button: u8,
        modifiers: u16,
    ) {
        let with_modifier = modifiers == self.bindings.modifier;

        if let Some(client) = xmodel.client_for_icon_window(window) {
            model.deiconify(client);
            return;
        }

        if with_modifier && button == self.bindings.launch_button {
            spawn(&self.shell);
            return;
        }

        if let Some(t) = client_of(model, window) {
            if with_modifier && button == self.bindings.move_button {
                model.start_moving(t);
            } else if with_modifier && button == self.bindings.resize_button {
                model.start_resizing(t);
            } else {
                // plain click on a grabbed (unfocused) window
                model.focus(window);
            }
        }
    }

    fn run_action<X: XConn>(&mut self, x: &X, model: &mut ClientModel, action: Action) -> Result<()> {
        // Client-targeting actions apply to the focused client; a focused
        // child resolves to its parent.
        let target = model
            .get_focused()
            .and_then(|f| client_of(model, f));

        match action {
            Action::NextDesktop => model.next_desktop(),
            Action::PrevDesktop => model.prev_desktop(),
            Action::CycleFocus => model.cycle_focus_forward(),
            Action::CycleFocusBack => model.cycle_focus_backward(),
            Action::ExitWm => {
                info!("exit requested");
                self.done = true;
            }

            // everything else needs a focused client
            _ => {
                let t = match target {
                    Some(t) => t,
                    None => return Ok(()),
                };

                match action {
                    Action::ClientNextDesktop => model.client_next_desktop(t),
                    Action::ClientPrevDesktop => model.client_prev_desktop(t),
                    Action::ToggleStick => model.toggle_stick(t),
                    Action::Iconify => model.iconify(t),
                    Action::Maximize => model.change_mode(t, CpsMode::Max),
                    Action::SnapLeft => model.change_mode(t, CpsMode::SplitLeft),
                    Action::SnapRight => model.change_mode(t, CpsMode::SplitRight),
                    Action::SnapTop => model.change_mode(t, CpsMode::SplitTop),
                    Action::SnapBottom => model.change_mode(t, CpsMode::SplitBottom),
                    Action::ScreenLeft => model.send_to_relative_screen(t, Direction::Left),
                    Action::ScreenRight => model.send_to_relative_screen(t, Direction::Right),
                    Action::ScreenTop => model.send_to_relative_screen(t, Direction::Up),
                    Action::ScreenBottom => model.send_to_relative_screen(t, Direction::Down),
                    Action::LayerAbove => model.up_layer(t),
                    Action::LayerBelow => model.down_layer(t),
                    Action::LayerTop => model.set_layer(t, MAX_LAYER),
                    Action::LayerBottom => model.set_layer(t, MIN_LAYER),
                    Action::RequestClose => x.send_delete(t)?,
                    Action::ForceClose => x.destroy_window(t)?,
                    _ => unreachable!("handled above"),
                }
            }
        }

        Ok(())
    }

    // Decide how to manage a window the server asked us to map: transient
    // windows become children of their owner, everything else becomes a
    // client on the current desktop.
    fn manage<X: XConn>(&self, x: &X, model: &mut ClientModel, window: Xid) -> Result<()> {
        let attrs = x.window_attributes(window)?;
        if attrs.override_redirect {
            debug!(%window, "not managing override-redirect window");
            return Ok(());
        }

        if let Ok(Some(parent)) = x.transient_for(window) {
            if model.is_client(parent) {
                debug!(%window, %parent, "managing transient window as a child");
                x.map(window)?;
                model.add_child(parent, window);
                return Ok(());
            }
        }

        let geom = x.get_geometry(window)?;
        if self.border_width > 0 {
            x.set_border_width(window, self.border_width)?;
        }

        let hint = if attrs.viewable {
            InitialVisibility::Visible
        } else {
            InitialVisibility::Hidden
        };

        debug!(%window, ?geom, ?hint, "managing new client");
        model.add_client(
            window,
            hint,
            Point::new(geom.x, geom.y),
            (geom.w, geom.h),
            true,
        );

        Ok(())
    }
}

// A window resolved to the client responsible for it: itself if it is a
// client, its parent if it is a child.
fn client_of(model: &ClientModel, window: Xid) -> Option<Xid> {
    if model.is_client(window) {
        Some(window)
    } else {
        model.get_parent_of(window)
    }
}

/// Run an external command, detached, with its output discarded.
fn spawn(cmd: &str) {
    let result = Command::new(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(e) = result {
        warn!(%e, %cmd, "could not spawn command");
    }
}
