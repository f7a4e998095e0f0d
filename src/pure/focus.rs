//! A restartable cursor over the focusable windows.
//!
//! The cycle holds every managed window (clients and their children) in
//! insertion order, with children kept immediately after their parent's
//! block so that a forward walk visits each parent followed by its children.
//! Which entries are currently focusable depends on model state the cycle
//! does not track (visibility, mapped-ness, iconification), so the walk
//! operations take a predicate supplied by the model.
use crate::Xid;

/// The ordered ring of windows traversed by the focus-cycling actions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FocusCycle {
    order: Vec<Xid>,
    cursor: Option<usize>,
}

impl FocusCycle {
    /// Append a window at the end of the cycle. Re-adding a known window is
    /// a no-op.
    pub fn add(&mut self, w: Xid) {
        if !self.order.contains(&w) {
            self.order.push(w);
        }
    }

    /// Insert `w` immediately after `anchor`, or at the end if the anchor is
    /// unknown. Used to keep children behind their parent's block.
    pub fn insert_after(&mut self, w: Xid, anchor: Xid) {
        if self.order.contains(&w) {
            return;
        }

        match self.order.iter().position(|&x| x == anchor) {
            Some(i) => {
                self.order.insert(i + 1, w);
                if let Some(c) = self.cursor {
                    if c > i {
                        self.cursor = Some(c + 1);
                    }
                }
            }
            None => self.order.push(w),
        }
    }

    /// Drop a window from the cycle. If it held the cursor, the cursor is
    /// cleared: the next walk restarts from the top of the ring.
    pub fn remove(&mut self, w: Xid) {
        if let Some(i) = self.order.iter().position(|&x| x == w) {
            self.order.remove(i);
            self.cursor = match self.cursor {
                Some(c) if c == i => None,
                Some(c) if c > i => Some(c - 1),
                other => other,
            };
        }
    }

    /// Position the cursor at the given window. Returns false (cursor
    /// unchanged) if the window is not part of the cycle.
    pub fn set_current(&mut self, w: Xid) -> bool {
        match self.order.iter().position(|&x| x == w) {
            Some(i) => {
                self.cursor = Some(i);
                true
            }
            None => false,
        }
    }

    /// The window currently under the cursor.
    pub fn current(&self) -> Option<Xid> {
        self.cursor.map(|i| self.order[i])
    }

    /// The next focusable window after the cursor, wrapping at the end.
    ///
    /// Entries rejected by the predicate are skipped. Returns `None` when
    /// nothing at all is focusable. With no cursor set the walk starts from
    /// the front of the ring.
    pub fn forward(&self, focusable: impl Fn(Xid) -> bool) -> Option<Xid> {
        self.walk(1, focusable)
    }

    /// The previous focusable window before the cursor, wrapping at the
    /// front.
    pub fn backward(&self, focusable: impl Fn(Xid) -> bool) -> Option<Xid> {
        self.walk(-1, focusable)
    }

    fn walk(&self, step: isize, focusable: impl Fn(Xid) -> bool) -> Option<Xid> {
        let n = self.order.len();
        if n == 0 {
            return None;
        }

        // With no cursor, bias the walk so the first candidate is the front
        // of the ring going forward and the back going backward.
        let start = match self.cursor {
            Some(c) => c as isize,
            None if step > 0 => -1,
            None => 0,
        };

        (1..=n as isize)
            .map(|i| (start + step * i).rem_euclid(n as isize) as usize)
            .map(|i| self.order[i])
            .find(|&w| focusable(w))
    }
}
