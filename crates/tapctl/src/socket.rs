//! Short-lived control sockets for flag and bridge ioctls.

use std::io;
use std::os::fd::{AsFd, FromRawFd, OwnedFd};

use tracing::debug;

use crate::error::{Error, Result};
use crate::ifname::IfName;
use crate::ioctl::{self, IfReq};
use crate::sys::{BridgeControl, FlagControl};

fn open_socket(domain: libc::c_int, ty: libc::c_int) -> io::Result<OwnedFd> {
    let fd = unsafe { libc::socket(domain, ty | libc::SOCK_CLOEXEC, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// An `AF_INET` datagram socket used only as an ioctl target.
#[derive(Debug)]
pub struct FlagSocket {
    fd: OwnedFd,
}

impl FlagSocket {
    /// Open the socket.
    pub fn open() -> Result<Self> {
        let fd = open_socket(libc::AF_INET, libc::SOCK_DGRAM)
            .map_err(|e| Error::ioctl("socket", e))?;
        Ok(Self { fd })
    }
}

impl FlagControl for FlagSocket {
    fn flags(&self, name: &IfName) -> io::Result<libc::c_short> {
        let mut req = IfReq::new(name);
        ioctl::ioctl_ifreq(self.fd.as_fd(), ioctl::SIOCGIFFLAGS, &mut req)?;
        debug!(%name, flags = req.flags(), "SIOCGIFFLAGS");
        Ok(req.flags())
    }

    fn set_flags(&self, name: &IfName, flags: libc::c_short) -> io::Result<()> {
        debug!(%name, flags, "SIOCSIFFLAGS");
        let mut req = IfReq::with_flags(name, flags);
        ioctl::ioctl_ifreq(self.fd.as_fd(), ioctl::SIOCSIFFLAGS, &mut req)
    }
}

/// An `AF_LOCAL` stream socket used for bridge administration.
#[derive(Debug)]
pub struct BridgeSocket {
    fd: OwnedFd,
}

impl BridgeSocket {
    /// Open the socket.
    pub fn open() -> Result<Self> {
        let fd = open_socket(libc::AF_LOCAL, libc::SOCK_STREAM)
            .map_err(|source| Error::BridgeSocketUnavailable { source })?;
        Ok(Self { fd })
    }
}

impl BridgeControl for BridgeSocket {
    fn add_interface(&self, bridge: &IfName, index: u32) -> io::Result<()> {
        debug!(%bridge, index, "SIOCBRADDIF");
        let mut req = IfReq::with_ifindex(bridge, index);
        ioctl::ioctl_ifreq(self.fd.as_fd(), ioctl::SIOCBRADDIF, &mut req)
    }
}
