//! Persistent TAP interface management.
//!
//! This crate creates, deletes, bridges and brings up or down persistent
//! TAP devices on Linux, the way a virtualization host wires a guest NIC
//! into host networking. It speaks the kernel's ioctl ABI directly: the
//! `/dev/net/tun` control node for device setup, a datagram socket for
//! interface flags and a local socket for bridge ports.
//!
//! # Overview
//!
//! Every operation is a short, fixed sequence of kernel calls. Handles are
//! opened immediately before use and closed by drop on every exit path,
//! including failures. Nothing is retried or rolled back: the first failure
//! is returned as an [`Error`] whose [`exit_code`](Error::exit_code) is
//! stable, and the kernel keeps whatever the completed steps did.
//!
//! # Example
//!
//! ```ignore
//! use tapctl::{Config, LinkState, TapManager};
//!
//! let manager = TapManager::new(Config::default());
//!
//! // Create a persistent TAP device owned by qemu:kvm, already up
//! let name = manager.create("tap0", "qemu", "kvm")?;
//!
//! // Plug it into an existing bridge
//! manager.bridge(name.as_str(), "br0")?;
//!
//! // Inspect it
//! let info = manager.query("tap0")?;
//! assert!(info.persistent && info.up);
//!
//! // Tear it down
//! manager.delete("tap0")?;
//! ```
//!
//! # Testing without root
//!
//! [`TapManager`] is generic over [`System`], the seam between the lifecycle
//! logic and the kernel. [`Kernel`] is the real implementation.

mod bridge;
mod channel;
mod config;
mod creds;
mod error;
mod ifname;
mod info;
mod ioctl;
mod lifecycle;
mod socket;
mod sys;

#[cfg(test)]
mod mock;

pub use bridge::attach;
pub use channel::Channel;
pub use config::Config;
pub use creds::{resolve_group, resolve_user};
pub use error::{ARGUMENT_ERROR_EXIT_CODE, Error, Result};
pub use ifname::{IFNAMSIZ, IfName, name_to_index};
pub use info::{Mode, TapInfo};
pub use ioctl::{IFF_NO_PI, IFF_PERSIST, IFF_TAP, IFF_TUN, IFF_UP, IfReq};
pub use lifecycle::{LinkState, TapManager};
pub use socket::{BridgeSocket, FlagSocket};
pub use sys::{BridgeControl, FlagControl, Kernel, System, TapControl};

/// The path to the TUN/TAP control node.
pub const TUN_DEVICE_PATH: &str = "/dev/net/tun";

/// The sysfs directory listing network interfaces.
pub const SYSFS_NET_PATH: &str = "/sys/class/net";

/// Owner user and group of devices created without explicit credentials.
pub const DEFAULT_OWNER: &str = "root";
