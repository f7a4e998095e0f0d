//! The X-side companion to the client model.
//!
//! [XModel] owns the surrogate state that only matters to the display
//! server: the icon window standing in for each minimized client, the at
//! most one in-progress move/resize gesture, and the short-lived
//! expected-map / expected-unmap flags the dispatcher sets before issuing
//! requests whose resulting events the adapter must ignore.
use crate::{pure::geometry::Point, Xid};
use std::collections::{BTreeMap, HashMap};

/// The dispatcher expects a map notify for this window.
pub const EXPECT_MAP: u8 = 1 << 0;
/// The dispatcher expects an unmap notify for this window.
pub const EXPECT_UNMAP: u8 = 1 << 1;

/// The surrogate window representing a minimized client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icon {
    /// The client the icon stands for
    pub client: Xid,
    /// The icon window itself
    pub window: Xid,
    /// The graphics context used to paint the icon
    pub gc: Xid,
}

/// Whether an in-progress gesture moves or resizes its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResizeKind {
    /// The gesture moves the client
    Move,
    /// The gesture resizes the client
    Resize,
}

/// The single in-progress interactive move or resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResize {
    /// The client being manipulated
    pub client: Xid,
    /// The placeholder window shown in its stead
    pub placeholder: Xid,
    /// Move or resize
    pub kind: MoveResizeKind,
}

/// A data store for the manager's own interface windows, as opposed to the
/// windows being managed.
#[derive(Debug, Default, Clone)]
pub struct XModel {
    // BTreeMap keeps icon reflow deterministic: icons lay out in client
    // window id order.
    icons: BTreeMap<Xid, Icon>,
    icon_windows: HashMap<Xid, Xid>,
    effects: HashMap<Xid, u8>,
    move_resize: Option<MoveResize>,
    pointer: Point,
}

impl XModel {
    /// Record a new icon. The model owns it until it is unregistered.
    pub fn register_icon(&mut self, icon: Icon) {
        self.icon_windows.insert(icon.window, icon.client);
        self.icons.insert(icon.client, icon);
    }

    /// Drop the icon for the given client, returning it so the caller can
    /// destroy the X resources it references.
    pub fn unregister_icon(&mut self, client: Xid) -> Option<Icon> {
        let icon = self.icons.remove(&client)?;
        self.icon_windows.remove(&icon.window);

        Some(icon)
    }

    /// The icon standing in for the given client, if it has one.
    pub fn icon_for_client(&self, client: Xid) -> Option<Icon> {
        self.icons.get(&client).copied()
    }

    /// The client behind the given icon window, if it is one.
    pub fn client_for_icon_window(&self, window: Xid) -> Option<Xid> {
        self.icon_windows.get(&window).copied()
    }

    /// All current icons in client window id order.
    pub fn icons(&self) -> impl Iterator<Item = &Icon> {
        self.icons.values()
    }

    /// Record the start of a move gesture. No-op if a gesture is already in
    /// progress.
    pub fn enter_move(&mut self, client: Xid, placeholder: Xid, pointer: Point) {
        self.enter(client, placeholder, MoveResizeKind::Move, pointer);
    }

    /// Record the start of a resize gesture. No-op if a gesture is already
    /// in progress.
    pub fn enter_resize(&mut self, client: Xid, placeholder: Xid, pointer: Point) {
        self.enter(client, placeholder, MoveResizeKind::Resize, pointer);
    }

    fn enter(&mut self, client: Xid, placeholder: Xid, kind: MoveResizeKind, pointer: Point) {
        if self.move_resize.is_some() {
            return;
        }

        self.move_resize = Some(MoveResize {
            client,
            placeholder,
            kind,
        });
        self.pointer = pointer;
    }

    /// Advance the recorded pointer position, returning the delta from the
    /// previous position. `(0, 0)` when no gesture is in progress.
    pub fn update_pointer(&mut self, x: i32, y: i32) -> (i32, i32) {
        if self.move_resize.is_none() {
            return (0, 0);
        }

        let diff = (x - self.pointer.x, y - self.pointer.y);
        self.pointer = Point::new(x, y);

        diff
    }

    /// The current gesture, if one is in progress.
    pub fn move_resize(&self) -> Option<MoveResize> {
        self.move_resize
    }

    /// The placeholder window of the current gesture.
    pub fn placeholder(&self) -> Option<Xid> {
        self.move_resize.map(|mr| mr.placeholder)
    }

    /// End the current gesture, returning its record for teardown.
    pub fn exit_move_resize(&mut self) -> Option<MoveResize> {
        self.move_resize.take()
    }

    /// Does the window have the given effect flag set?
    pub fn has_effect(&self, w: Xid, effect: u8) -> bool {
        (self.effects.get(&w).copied().unwrap_or(0) & effect) != 0
    }

    /// Set an effect flag on the given window.
    pub fn set_effect(&mut self, w: Xid, effect: u8) {
        *self.effects.entry(w).or_insert(0) |= effect;
    }

    /// Unset an effect flag on the given window.
    pub fn clear_effect(&mut self, w: Xid, effect: u8) {
        if let Some(bits) = self.effects.get_mut(&w) {
            *bits &= !effect;
            if *bits == 0 {
                self.effects.remove(&w);
            }
        }
    }

    /// Remove every effect flag from the given window.
    pub fn remove_all_effects(&mut self, w: Xid) {
        self.effects.remove(&w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_iterate_in_client_id_order() {
        let mut m = XModel::default();
        for (client, window) in [(5u32, 105u32), (1, 101), (3, 103)] {
            m.register_icon(Icon {
                client: Xid(client),
                window: Xid(window),
                gc: Xid(window + 1000),
            });
        }

        let clients: Vec<Xid> = m.icons().map(|i| i.client).collect();
        assert_eq!(clients, vec![Xid(1), Xid(3), Xid(5)]);
    }

    #[test]
    fn unregister_returns_the_icon_and_forgets_both_mappings() {
        let mut m = XModel::default();
        let icon = Icon {
            client: Xid(1),
            window: Xid(101),
            gc: Xid(201),
        };
        m.register_icon(icon);

        assert_eq!(m.icon_for_client(Xid(1)), Some(icon));
        assert_eq!(m.client_for_icon_window(Xid(101)), Some(Xid(1)));

        assert_eq!(m.unregister_icon(Xid(1)), Some(icon));
        assert_eq!(m.icon_for_client(Xid(1)), None);
        assert_eq!(m.client_for_icon_window(Xid(101)), None);
        assert_eq!(m.unregister_icon(Xid(1)), None);
    }

    #[test]
    fn only_one_gesture_is_recorded() {
        let mut m = XModel::default();
        m.enter_move(Xid(1), Xid(100), Point::new(5, 5));
        m.enter_resize(Xid(2), Xid(200), Point::new(9, 9));

        let mr = m.move_resize().unwrap();
        assert_eq!(mr.client, Xid(1));
        assert_eq!(mr.kind, MoveResizeKind::Move);

        assert!(m.exit_move_resize().is_some());
        assert!(m.move_resize().is_none());
    }

    #[test]
    fn pointer_updates_report_deltas() {
        let mut m = XModel::default();

        // no gesture: no movement reported
        assert_eq!(m.update_pointer(10, 10), (0, 0));

        m.enter_move(Xid(1), Xid(100), Point::new(10, 10));
        assert_eq!(m.update_pointer(15, 8), (5, -2));
        assert_eq!(m.update_pointer(15, 8), (0, 0));
    }

    #[test]
    fn effect_flags_set_test_and_clear() {
        let mut m = XModel::default();

        assert!(!m.has_effect(Xid(1), EXPECT_MAP));

        m.set_effect(Xid(1), EXPECT_MAP);
        m.set_effect(Xid(1), EXPECT_UNMAP);
        assert!(m.has_effect(Xid(1), EXPECT_MAP));
        assert!(m.has_effect(Xid(1), EXPECT_UNMAP));

        // clearing one flag leaves the other in place
        m.clear_effect(Xid(1), EXPECT_MAP);
        assert!(!m.has_effect(Xid(1), EXPECT_MAP));
        assert!(m.has_effect(Xid(1), EXPECT_UNMAP));

        m.remove_all_effects(Xid(1));
        assert!(!m.has_effect(Xid(1), EXPECT_UNMAP));
    }
}
