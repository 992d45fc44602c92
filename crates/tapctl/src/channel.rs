//! The tap control channel.
//!
//! Every configuration batch opens the control node, issues its ioctls and
//! closes it again. The descriptor lives in a [`File`], so it is closed
//! exactly once, when the channel is dropped, on every return path.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::ifname::IfName;
use crate::ioctl::{self, IfReq};
use crate::sys::TapControl;

/// An open handle to the tap control node.
#[derive(Debug)]
pub struct Channel {
    file: File,
    path: PathBuf,
}

impl Channel {
    /// Open the control node read/write.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| Error::ControlNodeUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), "opened tap control node");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the control node.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TapControl for Channel {
    fn set_iff(&mut self, name: &IfName, flags: libc::c_short) -> io::Result<IfName> {
        debug!(%name, flags, "TUNSETIFF");
        let mut req = IfReq::with_flags(name, flags);
        ioctl::ioctl_ifreq(self.file.as_fd(), ioctl::TUNSETIFF, &mut req)?;
        Ok(req.name())
    }

    fn set_owner(&mut self, uid: u32) -> io::Result<()> {
        debug!(uid, "TUNSETOWNER");
        ioctl::ioctl_value(self.file.as_fd(), ioctl::TUNSETOWNER, uid as libc::c_ulong)
    }

    fn set_group(&mut self, gid: u32) -> io::Result<()> {
        debug!(gid, "TUNSETGROUP");
        ioctl::ioctl_value(self.file.as_fd(), ioctl::TUNSETGROUP, gid as libc::c_ulong)
    }

    fn set_persist(&mut self, persist: bool) -> io::Result<()> {
        debug!(persist, "TUNSETPERSIST");
        ioctl::ioctl_value(
            self.file.as_fd(),
            ioctl::TUNSETPERSIST,
            persist as libc::c_ulong,
        )
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "closing tap control node");
    }
}
