//! Geometry primitives
use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// An x,y coordinate pair in display coordinates.
///
/// Coordinates are signed: with multiple monitors the visible region is not
/// anchored at the origin, and `(-1, -1)` is used as a "parked off screen"
/// sentinel for windows that have never been placed.
#[derive(Serialize, Deserialize, Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Point {
    /// An absolute x coordinate relative to the root window
    pub x: i32,
    /// An absolute y coordinate relative to the root window
    pub y: i32,
}

impl Point {
    /// Create a new Point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from(raw: (i32, i32)) -> Self {
        let (x, y) = raw;

        Self { x, y }
    }
}

/// An X window / screen position: top left corner + extent
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Rect {
    /// The x-coordinate of the top left corner of this rect
    pub x: i32,
    /// The y-coordinate of the top left corner of this rect
    pub y: i32,
    /// The width of this rect
    pub w: u32,
    /// The height of this rect
    pub h: u32,
}

impl Rect {
    /// Create a new Rect.
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Rect {
        Rect { x, y, w, h }
    }

    /// The midpoint of this rectangle.
    ///
    /// Odd side lengths will lead to a truncated point towards the top left
    /// corner in order to maintain integer coordinates.
    pub fn midpoint(&self) -> Point {
        Point {
            x: self.x + (self.w / 2) as i32,
            y: self.y + (self.h / 2) as i32,
        }
    }

    /// The x-coordinate one past the right edge of this rect.
    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }

    /// The y-coordinate one past the bottom edge of this rect.
    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }

    /// Check whether a [Point] is within the bounds of this rect.
    pub fn contains_point(&self, p: Point) -> bool {
        (self.x..self.right()).contains(&p.x) && (self.y..self.bottom()).contains(&p.y)
    }

    /// Check whether this rect and `other` overlap in at least one point.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The squared distance from the center of this rect to the center of
    /// `other`. Used for "closest monitor" queries where only the ordering
    /// matters, so the square root is never taken.
    pub fn distance_to(&self, other: &Rect) -> i64 {
        let a = self.midpoint();
        let b = other.midpoint();
        let (dx, dy) = ((a.x - b.x) as i64, (a.y - b.y) as i64);

        dx * dx + dy * dy
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.w, self.h)
    }
}

/// A cardinal direction on the screen.
#[derive(Serialize, Deserialize, EnumIter, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards decreasing y
    Up,
    /// Towards increasing y
    Down,
    /// Towards decreasing x
    Left,
    /// Towards increasing x
    Right,
}

/// A corner of the root screen that packed clients can be anchored against.
#[derive(Serialize, Deserialize, EnumIter, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Top left
    NorthWest,
    /// Top right
    NorthEast,
    /// Bottom left
    SouthWest,
    /// Bottom right
    SouthEast,
}
