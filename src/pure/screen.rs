//! A planar adjacency graph over the connected monitors.
//!
//! Monitors are value-type [Rect]s; two of them are neighbours in a given
//! direction when they share an edge and overlap along it. The graph is
//! rebuilt wholesale whenever the display server reports a monitor
//! reconfiguration.
use crate::pure::geometry::{Direction, Point, Rect};

/// The set of connected monitor boxes and their cardinal adjacencies.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScreenGraph {
    boxes: Vec<Rect>,
}

impl ScreenGraph {
    /// Build a graph from the given monitor boxes.
    pub fn new(boxes: Vec<Rect>) -> Self {
        Self { boxes }
    }

    /// Replace the monitor list following a reconfiguration.
    pub fn rebuild(&mut self, boxes: Vec<Rect>) {
        self.boxes = boxes;
    }

    /// All known monitor boxes, in the order the server reported them.
    pub fn boxes(&self) -> &[Rect] {
        &self.boxes
    }

    /// True if `r` is one of the known monitors.
    pub fn is_screen(&self, r: &Rect) -> bool {
        self.boxes.contains(r)
    }

    /// The root screen: the monitor anchored at the origin, which hosts the
    /// icon row. Falls back to the first reported monitor when no monitor
    /// sits at `(0, 0)`.
    pub fn root(&self) -> Option<Rect> {
        self.boxes
            .iter()
            .find(|b| b.x == 0 && b.y == 0)
            .or_else(|| self.boxes.first())
            .copied()
    }

    /// The monitor whose bounds contain the given point.
    pub fn containing(&self, p: Point) -> Option<Rect> {
        self.boxes.iter().find(|b| b.contains_point(p)).copied()
    }

    /// The neighbour of `from` in the given direction, if any.
    ///
    /// Two boxes are `Right`-neighbours when `from`'s right edge equals the
    /// candidate's left edge and their vertical intervals overlap; the other
    /// directions are analogous.
    pub fn neighbor(&self, from: Rect, dir: Direction) -> Option<Rect> {
        self.boxes
            .iter()
            .copied()
            .find(|b| match dir {
                Direction::Left => from.x == b.right() && vertical_overlap(&from, b),
                Direction::Right => from.right() == b.x && vertical_overlap(&from, b),
                Direction::Up => from.y == b.bottom() && horizontal_overlap(&from, b),
                Direction::Down => from.bottom() == b.y && horizontal_overlap(&from, b),
            })
    }

    /// The monitor closest to `r` by center-to-center distance. Used to
    /// re-home clients stranded by a monitor reconfiguration.
    pub fn closest_to(&self, r: &Rect) -> Option<Rect> {
        self.boxes.iter().min_by_key(|b| b.distance_to(r)).copied()
    }

}

fn vertical_overlap(a: &Rect, b: &Rect) -> bool {
    a.y < b.bottom() && b.y < a.bottom()
}

fn horizontal_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && b.x < a.right()
}
