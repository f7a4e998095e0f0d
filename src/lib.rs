//! A floating, multi-desktop window manager for X11.
//!
//! driftwm keeps all window-manager state in a pure, side-effect free
//! [ClientModel][crate::pure::ClientModel]: every public mutation updates the
//! model and appends [Change][crate::pure::Change] events to an ordered
//! stream. The [dispatch][crate::dispatch] module drains that stream between
//! event-loop ticks and projects each change onto calls against an
//! [XConn][crate::x::XConn], the trait boundary hiding the display server.
//!
//! Nothing in [pure][crate::pure] touches X: the model can be driven and
//! inspected entirely in memory, which is how the bulk of the test suite
//! works.
#![warn(missing_docs, rust_2018_idioms)]
#![deny(clippy::all)]

pub mod bindings;
pub mod config;
pub mod dispatch;
pub mod pure;
pub mod x;

#[doc(inline)]
pub use crate::{
    config::WmConfig,
    pure::{Change, ClientModel, Desktop},
    x::XConn,
};

/// A server-assigned window or resource handle.
///
/// Handles are plain numbers on the wire, but the manager juggles several
/// kinds of them (client windows, icon surrogates, placeholders, graphics
/// contexts); the newtype keeps them from being mixed up with counters and
/// coordinates. Ordering and hashing follow the raw id so handles can key
/// the model's maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Xid(pub(crate) u32);

impl Xid {
    /// The raw numeric id, for handing back to the server.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Xid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for Xid {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// The ways driftwm can fail.
///
/// Errors out of the display server are collapsed into two cases: the
/// connection-level failures that end the session ([Display][Error::Display])
/// and per-request failures the dispatcher logs and rides out
/// ([Request][Error::Request]). Everything else is a startup or model-level
/// problem.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A config file was malformed or contained invalid values
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The display could not be opened, or the connection to it broke
    #[error("display connection failed: {0}")]
    Display(String),

    /// A desktop index outside of the configured range was requested
    #[error("desktop index {index} is out of range for {num_desktops} desktops")]
    InvalidDesktop {
        /// The requested index
        index: usize,
        /// The number of user desktops the model was built with
        num_desktops: usize,
    },

    /// The display server lacks the RandR extension, which is needed to
    /// track the monitor layout
    #[error("the display server cannot report monitor layouts (no RandR)")]
    NoRandR,

    /// A single request against the display server failed
    #[error("request to the display server failed: {0}")]
    Request(String),

    /// A window handle that does not belong to a managed client was used
    /// where one was required
    #[error("window {0} is not a managed client")]
    UnknownClient(Xid),
}

impl From<::x11rb::errors::ConnectError> for Error {
    fn from(e: ::x11rb::errors::ConnectError) -> Self {
        Error::Display(e.to_string())
    }
}

impl From<::x11rb::errors::ConnectionError> for Error {
    fn from(e: ::x11rb::errors::ConnectionError) -> Self {
        Error::Display(e.to_string())
    }
}

impl From<::x11rb::errors::ReplyError> for Error {
    fn from(e: ::x11rb::errors::ReplyError) -> Self {
        Error::Request(e.to_string())
    }
}

impl From<::x11rb::errors::ReplyOrIdError> for Error {
    fn from(e: ::x11rb::errors::ReplyOrIdError) -> Self {
        Error::Request(e.to_string())
    }
}

/// A Result where the error type is a driftwm [Error]
pub type Result<T> = std::result::Result<T, Error>;
