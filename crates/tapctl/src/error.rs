//! Error types for tap lifecycle operations.
//!
//! Every failure kind maps to a fixed process exit status so that scripts
//! driving the `tapctl` binary can branch on it. The statuses are part of
//! the command-line contract and never change between releases.

use std::io;
use std::path::PathBuf;

/// Result type for tap lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status for malformed or missing command-line input.
///
/// Argument errors never reach the library; the binary reports them with
/// this status before any operation runs.
pub const ARGUMENT_ERROR_EXIT_CODE: i32 = 1;

/// Errors that can occur while managing tap interfaces.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tap control node could not be opened.
    #[error("couldn't open control node {}: {source}", .path.display())]
    ControlNodeUnavailable {
        /// Path of the control node.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A single ioctl (or the socket it needs) failed.
    #[error("ioctl {name} failed: {source}")]
    Ioctl {
        /// The ioctl name.
        name: &'static str,
        /// The underlying error.
        source: io::Error,
    },

    /// User not found.
    #[error("no user: {name}{}", os_suffix(.source))]
    UserNotFound {
        /// The user name that was looked up.
        name: String,
        /// Set when the lookup itself failed rather than finding nothing.
        source: Option<io::Error>,
    },

    /// Group not found.
    #[error("no group: {name}{}", os_suffix(.source))]
    GroupNotFound {
        /// The group name that was looked up.
        name: String,
        /// Set when the lookup itself failed rather than finding nothing.
        source: Option<io::Error>,
    },

    /// The bridge administration socket could not be created.
    #[error("bridge API socket creation failed: {source}")]
    BridgeSocketUnavailable {
        /// The underlying error.
        source: io::Error,
    },

    /// The interface does not exist.
    #[error("couldn't find tap interface {name}: {source}")]
    InterfaceNotFound {
        /// The interface name.
        name: String,
        /// The underlying error.
        source: io::Error,
    },

    /// The bridge refused the interface.
    #[error("couldn't bridge interface {name} to {bridge}: {source}")]
    BridgeAttachFailed {
        /// The interface being attached.
        name: String,
        /// The bridge it was attached to.
        bridge: String,
        /// The underlying error.
        source: io::Error,
    },

    /// Reading interface state from sysfs failed.
    #[error("couldn't read {}: {source}", .path.display())]
    Query {
        /// The sysfs path that failed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl Error {
    /// Create an ioctl error.
    pub fn ioctl(name: &'static str, source: io::Error) -> Self {
        Error::Ioctl { name, source }
    }

    /// The process exit status for this error.
    ///
    /// Status 1 is reserved for [`ARGUMENT_ERROR_EXIT_CODE`].
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ControlNodeUnavailable { .. } => 2,
            Error::Ioctl { .. } => 3,
            Error::UserNotFound { .. } => 4,
            Error::GroupNotFound { .. } => 5,
            Error::BridgeSocketUnavailable { .. } => 6,
            Error::InterfaceNotFound { .. } => 7,
            Error::BridgeAttachFailed { .. } => 8,
            Error::Query { .. } => 9,
        }
    }

    /// The OS-level error behind this failure, if there is one.
    pub fn os_error(&self) -> Option<&io::Error> {
        match self {
            Error::ControlNodeUnavailable { source, .. }
            | Error::Ioctl { source, .. }
            | Error::BridgeSocketUnavailable { source }
            | Error::InterfaceNotFound { source, .. }
            | Error::BridgeAttachFailed { source, .. }
            | Error::Query { source, .. } => Some(source),
            Error::UserNotFound { source, .. } | Error::GroupNotFound { source, .. } => {
                source.as_ref()
            }
        }
    }
}

fn os_suffix(source: &Option<io::Error>) -> String {
    match source {
        Some(err) => format!(": {err}"),
        None => String::new(),
    }
}
