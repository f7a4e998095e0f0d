//! Side effect free state management for the window manager
pub mod change;
pub mod desktop;
pub mod focus;
pub mod geometry;
pub mod model;
pub mod screen;

pub use change::{Change, ChangeStream};
pub use desktop::Desktop;
pub use focus::FocusCycle;
pub use geometry::{Corner, Direction, Point, Rect};
pub use model::{ClientModel, CpsMode, InitialVisibility, Layer, DEF_LAYER, MAX_LAYER, MIN_LAYER};
pub use screen::ScreenGraph;
