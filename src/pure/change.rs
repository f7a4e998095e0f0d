//! The change stream published by the client model.
//!
//! Every mutating [ClientModel][crate::pure::ClientModel] call appends zero
//! or more [Change] records before it returns. Changes carry both the
//! previous and next value where a consumer would otherwise need to mirror
//! model state to make sense of them. The stream is a strictly ordered,
//! single-consumer FIFO: the dispatcher drains it between event-loop ticks
//! and owns each event on dequeue.
use crate::{
    pure::{desktop::Desktop, geometry::Rect, model::CpsMode, model::Layer},
    Xid,
};
use std::collections::VecDeque;

/// A single externally-observable transition in the client model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A client moved between desktops. `prev` is `None` for freshly added
    /// clients.
    ClientDesktop {
        /// The client that moved
        window: Xid,
        /// Where it was (None on creation)
        prev: Option<Desktop>,
        /// Where it is now
        next: Desktop,
    },

    /// The currently shown user desktop changed.
    CurrentDesktop {
        /// The previously shown desktop
        prev: Desktop,
        /// The newly shown desktop
        next: Desktop,
    },

    /// A client moved to a different stacking layer.
    Layer {
        /// The client that moved
        window: Xid,
        /// Its new layer
        layer: Layer,
    },

    /// Input focus moved. One or both sides may be `None` (focus parked on
    /// the root window).
    Focus {
        /// The window losing focus
        prev: Option<Xid>,
        /// The window gaining focus
        next: Option<Xid>,
    },

    /// A client was moved.
    Location {
        /// The client that moved
        window: Xid,
        /// New x coordinate
        x: i32,
        /// New y coordinate
        y: i32,
    },

    /// A client was resized.
    Size {
        /// The client that was resized
        window: Xid,
        /// New width
        w: u32,
        /// New height
        h: u32,
    },

    /// A client was re-homed to a different monitor.
    Screen {
        /// The client that moved
        window: Xid,
        /// The bounds of its new monitor
        bounds: Rect,
    },

    /// A client changed its position/scale discipline.
    Mode {
        /// The client that changed
        window: Xid,
        /// Its new mode
        mode: CpsMode,
    },

    /// A transient child was attached to a parent client.
    ChildAdd {
        /// The parent client
        parent: Xid,
        /// The new child
        child: Xid,
    },

    /// A transient child was detached from its parent.
    ChildRemove {
        /// The parent client
        parent: Xid,
        /// The removed child
        child: Xid,
    },

    /// A client was unmapped by its application and is no longer usable
    /// until it maps itself again.
    Unmap {
        /// The unmapped client
        window: Xid,
    },

    /// A client was removed from the model. Carries the state needed for
    /// the dispatcher to tear down any surrogate windows.
    Destroy {
        /// The destroyed client
        window: Xid,
        /// The desktop it was on when destroyed
        last_desktop: Desktop,
        /// The layer it was on when destroyed
        last_layer: Layer,
    },
}

/// An ordered queue of [Change] records.
///
/// Pushed to by the model, drained by the dispatcher; both run on the same
/// thread so no locking is involved.
#[derive(Debug, Default, Clone)]
pub struct ChangeStream {
    changes: VecDeque<Change>,
}

impl ChangeStream {
    /// Append a change to the end of the stream.
    pub fn push(&mut self, change: Change) {
        self.changes.push_back(change);
    }

    /// Take ownership of the oldest queued change, if any.
    pub fn next_change(&mut self) -> Option<Change> {
        self.changes.pop_front()
    }

    /// True if there are no queued changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The number of queued changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Discard all queued changes.
    pub fn flush(&mut self) {
        self.changes.clear();
    }
}
