//! The kernel-facing seam of the lifecycle controller.
//!
//! [`TapManager`](crate::TapManager) never touches libc directly: it asks a
//! [`System`] for credentials and for short-lived handles, and every handle
//! releases its descriptor when dropped. [`Kernel`] is the real
//! implementation; tests substitute a recording mock.

use std::io;
use std::path::PathBuf;

use crate::channel::Channel;
use crate::creds;
use crate::error::Result;
use crate::ifname::{self, IfName};
use crate::socket::{BridgeSocket, FlagSocket};

/// Configuration calls on an open tap control channel.
pub trait TapControl {
    /// `TUNSETIFF`: create or attach to `name`. Returns the name the kernel
    /// actually used.
    fn set_iff(&mut self, name: &IfName, flags: libc::c_short) -> io::Result<IfName>;

    /// `TUNSETOWNER`.
    fn set_owner(&mut self, uid: u32) -> io::Result<()>;

    /// `TUNSETGROUP`.
    fn set_group(&mut self, gid: u32) -> io::Result<()>;

    /// `TUNSETPERSIST`.
    fn set_persist(&mut self, persist: bool) -> io::Result<()>;
}

/// Interface flag access over a generic datagram socket.
pub trait FlagControl {
    /// `SIOCGIFFLAGS`.
    fn flags(&self, name: &IfName) -> io::Result<libc::c_short>;

    /// `SIOCSIFFLAGS`.
    fn set_flags(&self, name: &IfName, flags: libc::c_short) -> io::Result<()>;
}

/// Bridge administration over a local control socket.
pub trait BridgeControl {
    /// `SIOCBRADDIF`: make interface `index` a port of `bridge`.
    fn add_interface(&self, bridge: &IfName, index: u32) -> io::Result<()>;
}

/// Everything the lifecycle controller needs from the host.
pub trait System {
    /// Handle to the tap control node.
    type Channel: TapControl;
    /// Socket used for flag get/set.
    type FlagSocket: FlagControl;
    /// Socket used for bridge administration.
    type BridgeSocket: BridgeControl;

    /// Resolve a user name to a UID.
    fn resolve_user(&self, name: &str) -> Result<u32>;

    /// Resolve a group name to a GID.
    fn resolve_group(&self, name: &str) -> Result<u32>;

    /// Open the tap control node.
    fn open_channel(&self) -> Result<Self::Channel>;

    /// Open a datagram socket for flag manipulation.
    fn open_flag_socket(&self) -> Result<Self::FlagSocket>;

    /// Open a local socket for bridge administration.
    fn open_bridge_socket(&self) -> Result<Self::BridgeSocket>;

    /// Resolve an interface name to its index.
    fn name_to_index(&self, name: &IfName) -> io::Result<u32>;
}

/// The running kernel.
#[derive(Debug, Clone)]
pub struct Kernel {
    tun_device: PathBuf,
}

impl Kernel {
    /// Use the tap control node at `tun_device`.
    pub fn new(tun_device: impl Into<PathBuf>) -> Self {
        Self {
            tun_device: tun_device.into(),
        }
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(crate::TUN_DEVICE_PATH)
    }
}

impl System for Kernel {
    type Channel = Channel;
    type FlagSocket = FlagSocket;
    type BridgeSocket = BridgeSocket;

    fn resolve_user(&self, name: &str) -> Result<u32> {
        creds::resolve_user(name)
    }

    fn resolve_group(&self, name: &str) -> Result<u32> {
        creds::resolve_group(name)
    }

    fn open_channel(&self) -> Result<Channel> {
        Channel::open(&self.tun_device)
    }

    fn open_flag_socket(&self) -> Result<FlagSocket> {
        FlagSocket::open()
    }

    fn open_bridge_socket(&self) -> Result<BridgeSocket> {
        BridgeSocket::open()
    }

    fn name_to_index(&self, name: &IfName) -> io::Result<u32> {
        ifname::name_to_index(name)
    }
}
