//! Logic for interacting with the X server
//!
//! [XConn] is the boundary between driftwm and the display server: every
//! capability the dispatcher or the event adapter needs is a method on the
//! trait, so the whole manager can be driven against a test double. The
//! real implementation over x11rb lives in [conn].
use crate::{
    pure::geometry::{Point, Rect},
    Result, Xid,
};

pub mod conn;
pub mod events;
pub mod model;

#[cfg(test)]
pub mod mock;

pub use events::EventAdapter;
pub use model::{Icon, MoveResize, MoveResizeKind, XModel, EXPECT_MAP, EXPECT_UNMAP};

/// The window attributes the manager inspects when deciding whether and how
/// to manage a window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    /// Windows with override-redirect set are never managed
    pub override_redirect: bool,
    /// Whether the window is currently viewable on screen
    pub viewable: bool,
}

/// An event delivered by the display server, reduced to the cases the
/// manager reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XEvent {
    /// A grabbed key combination was pressed
    KeyPress {
        /// The resolved key symbol
        keysym: u32,
        /// The held modifier mask
        modifiers: u16,
    },
    /// A pointer button was pressed on a window we grabbed
    ButtonPress {
        /// The window the press landed on
        window: Xid,
        /// The pressed button
        button: u8,
        /// The held modifier mask
        modifiers: u16,
    },
    /// A pointer button was released
    ButtonRelease {
        /// The released button
        button: u8,
    },
    /// The pointer moved
    Motion {
        /// The pointer position relative to the root window
        point: Point,
    },
    /// A window asked to be mapped
    MapRequest {
        /// The window in question
        window: Xid,
    },
    /// A window became viewable
    MapNotify {
        /// The window in question
        window: Xid,
    },
    /// A window stopped being viewable
    UnmapNotify {
        /// The window in question
        window: Xid,
    },
    /// A window was destroyed
    DestroyNotify {
        /// The window in question
        window: Xid,
    },
    /// A window asked to be moved or resized
    ConfigureRequest {
        /// The window in question
        window: Xid,
        /// The requested geometry
        rect: Rect,
    },
    /// A region of a window needs repainting
    Expose {
        /// The window in question
        window: Xid,
    },
    /// The monitor layout changed
    MonitorsChanged,
    /// An event driftwm has no interest in
    Ignored,
}

/// A handle on a running X connection used for issuing requests.
///
/// All methods that issue a request return a `Result`: the dispatcher treats
/// failures as transient, logs them and keeps going, so implementations
/// should not retry internally.
pub trait XConn {
    /// The ID of the window manager root window.
    fn root(&self) -> Xid;
    /// Ask the server for the dimensions of each connected monitor.
    fn monitors(&self) -> Result<Vec<Rect>>;
    /// The current position of the pointer relative to the root window.
    fn cursor_position(&self) -> Result<Point>;
    /// Block and wait for the next event from the server.
    fn next_event(&self) -> Result<XEvent>;
    /// Flush any pending requests to the server.
    fn flush(&self);

    /// Create an unmanaged (override-redirect) utility window with the
    /// given geometry. Used for icons and move/resize placeholders.
    fn create_window(&self, r: Rect) -> Result<Xid>;
    /// Destroy a window.
    fn destroy_window(&self, w: Xid) -> Result<()>;
    /// Map a window, making it visible.
    fn map(&self, w: Xid) -> Result<()>;
    /// Unmap a window, hiding it.
    fn unmap(&self, w: Xid) -> Result<()>;
    /// Move a window to the given root coordinates.
    fn move_window(&self, w: Xid, x: i32, y: i32) -> Result<()>;
    /// Resize a window.
    fn resize_window(&self, w: Xid, width: u32, height: u32) -> Result<()>;
    /// Raise a window to the top of the stacking order.
    fn raise(&self, w: Xid) -> Result<()>;

    /// Give the input focus to a window.
    fn set_input_focus(&self, w: Xid) -> Result<()>;
    /// Park the input focus on the root window.
    fn focus_root(&self) -> Result<()>;

    /// Grab pointer clicks on a window so that clicking an unfocused client
    /// reaches the manager instead of the client.
    fn grab_mouse(&self, w: Xid) -> Result<()>;
    /// Release a click grab installed with [grab_mouse][XConn::grab_mouse].
    fn ungrab_mouse(&self, w: Xid) -> Result<()>;
    /// Confine the pointer to a window for the duration of a gesture.
    fn confine_pointer(&self, w: Xid) -> Result<()>;
    /// Release the pointer confinement.
    fn release_pointer(&self) -> Result<()>;

    /// Set the one-color border of a window.
    fn set_border_color(&self, w: Xid, pixel: u32) -> Result<()>;
    /// Set the border width of a window.
    fn set_border_width(&self, w: Xid, width: u32) -> Result<()>;

    /// Create a graphics context for drawing into the given window.
    fn create_gc(&self, w: Xid) -> Result<Xid>;
    /// Free a graphics context created with [create_gc][XConn::create_gc].
    fn free_gc(&self, gc: Xid) -> Result<()>;
    /// Paint an icon's background and title text.
    fn draw_icon(&self, w: Xid, gc: Xid, title: &str) -> Result<()>;

    /// The current geometry of a window.
    fn get_geometry(&self, w: Xid) -> Result<Rect>;
    /// The attributes of a window.
    fn window_attributes(&self, w: Xid) -> Result<WindowAttributes>;
    /// The title of a window, or an empty string when unset.
    fn window_title(&self, w: Xid) -> Result<String>;
    /// The window this window is transient for, if any.
    fn transient_for(&self, w: Xid) -> Result<Option<Xid>>;
    /// All current children of the root window, for adoption at startup.
    fn existing_windows(&self) -> Result<Vec<Xid>>;

    /// Register a global hotkey for the given keysym and modifier mask.
    fn grab_key(&self, keysym: u32, modifiers: u16) -> Result<()>;
    /// Register a global grab for the given pointer button and modifiers.
    fn grab_button(&self, button: u8, modifiers: u16) -> Result<()>;
    /// Politely ask a window to close via a delete-window client message.
    fn send_delete(&self, w: Xid) -> Result<()>;
}
