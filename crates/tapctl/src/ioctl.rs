//! Kernel ioctl numbers and the `ifreq` record they exchange.

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};

use crate::ifname::IfName;

// TUN/TAP ioctl constants (from linux/if_tun.h)
pub(crate) const TUNSETIFF: libc::Ioctl = 0x400454ca as libc::Ioctl;
pub(crate) const TUNSETPERSIST: libc::Ioctl = 0x400454cb as libc::Ioctl;
pub(crate) const TUNSETOWNER: libc::Ioctl = 0x400454cc as libc::Ioctl;
pub(crate) const TUNSETGROUP: libc::Ioctl = 0x400454ce as libc::Ioctl;

// Socket ioctl constants (from linux/sockios.h)
pub(crate) const SIOCGIFFLAGS: libc::Ioctl = 0x8913 as libc::Ioctl;
pub(crate) const SIOCSIFFLAGS: libc::Ioctl = 0x8914 as libc::Ioctl;
pub(crate) const SIOCBRADDIF: libc::Ioctl = 0x89a2 as libc::Ioctl;

// TUN/TAP flags (from linux/if_tun.h)
/// TUN device (Layer 3).
pub const IFF_TUN: libc::c_short = 0x0001;
/// TAP device (Layer 2).
pub const IFF_TAP: libc::c_short = 0x0002;
/// Device survives its creating process.
pub const IFF_PERSIST: libc::c_short = 0x0800;
/// No protocol information.
pub const IFF_NO_PI: libc::c_short = 0x1000;

/// Interface is administratively up (from linux/if.h).
pub const IFF_UP: libc::c_short = 0x0001;

/// A zeroed `struct ifreq` carrying an interface name.
///
/// Built fresh for every ioctl; the kernel may write the name or the
/// flags/index union back into it.
pub struct IfReq(libc::ifreq);

impl IfReq {
    /// Create a request for `name` with an empty union.
    pub fn new(name: &IfName) -> Self {
        let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
        ifr.ifr_name = name.to_raw();
        Self(ifr)
    }

    /// Create a request carrying `flags`.
    pub fn with_flags(name: &IfName, flags: libc::c_short) -> Self {
        let mut req = Self::new(name);
        req.set_flags(flags);
        req
    }

    /// Create a request carrying an interface index.
    pub fn with_ifindex(name: &IfName, index: u32) -> Self {
        let mut req = Self::new(name);
        req.0.ifr_ifru.ifru_ifindex = index as libc::c_int;
        req
    }

    /// The name currently in the request (the kernel may have filled it).
    pub fn name(&self) -> IfName {
        IfName::from_raw(&self.0.ifr_name)
    }

    /// The flags half of the union.
    pub fn flags(&self) -> libc::c_short {
        unsafe { self.0.ifr_ifru.ifru_flags }
    }

    /// Overwrite the flags half of the union.
    pub fn set_flags(&mut self, flags: libc::c_short) {
        self.0.ifr_ifru.ifru_flags = flags;
    }

    /// The index half of the union.
    pub fn ifindex(&self) -> u32 {
        unsafe { self.0.ifr_ifru.ifru_ifindex as u32 }
    }
}

/// Issue an ioctl that reads and/or writes an `ifreq`.
pub(crate) fn ioctl_ifreq(
    fd: BorrowedFd<'_>,
    request: libc::Ioctl,
    req: &mut IfReq,
) -> io::Result<()> {
    let ret = unsafe { libc::ioctl(fd.as_raw_fd(), request, &mut req.0 as *mut libc::ifreq) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Issue an ioctl whose argument is passed by value.
pub(crate) fn ioctl_value(
    fd: BorrowedFd<'_>,
    request: libc::Ioctl,
    value: libc::c_ulong,
) -> io::Result<()> {
    let ret = unsafe { libc::ioctl(fd.as_raw_fd(), request, value) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
