//! Read-only view of tun/tap interfaces from sysfs.
//!
//! The kernel is the only record of what this crate creates, so queries go
//! straight to `/sys/class/net/<dev>` rather than to anything cached.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};
use crate::ifname::IfName;
use crate::ioctl::{IFF_NO_PI, IFF_PERSIST, IFF_TAP, IFF_TUN, IFF_UP};

/// Device mode (TUN or TAP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// TUN device - operates at Layer 3 (IP packets).
    Tun,
    /// TAP device - operates at Layer 2 (Ethernet frames).
    Tap,
}

impl Mode {
    /// Get the mode name.
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Tun => "tun",
            Mode::Tap => "tap",
        }
    }
}

/// Information about a TUN/TAP device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct TapInfo {
    /// Device name.
    pub name: String,
    /// Interface index.
    pub index: u32,
    /// Device mode.
    pub mode: Mode,
    /// Owner UID, if one is set.
    pub owner: Option<u32>,
    /// Group GID, if one is set.
    pub group: Option<u32>,
    /// Survives its creating process.
    pub persistent: bool,
    /// Frames carry no protocol info header.
    pub no_pi: bool,
    /// Administratively up.
    pub up: bool,
    /// Bridge this device is a port of.
    pub bridge: Option<String>,
}

impl fmt::Display for TapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} index {}", self.name, self.mode.name(), self.index)?;
        if let Some(uid) = self.owner {
            write!(f, " user {uid}")?;
        }
        if let Some(gid) = self.group {
            write!(f, " group {gid}")?;
        }
        if self.persistent {
            write!(f, " persist")?;
        }
        if self.no_pi {
            write!(f, " no_pi")?;
        }
        write!(f, " {}", if self.up { "up" } else { "down" })?;
        if let Some(ref bridge) = self.bridge {
            write!(f, " master {bridge}")?;
        }
        Ok(())
    }
}

/// Read one tun/tap interface under `root` (normally `/sys/class/net`).
pub fn query(root: &Path, name: &IfName) -> Result<TapInfo> {
    // Interface names never contain '/' and are never "." or ".."
    if matches!(name.as_str(), "" | "." | "..") || name.as_str().contains('/') {
        return Err(Error::InterfaceNotFound {
            name: name.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "invalid interface name"),
        });
    }

    let dir = root.join(name.as_str());
    if !dir.is_dir() {
        return Err(Error::InterfaceNotFound {
            name: name.to_string(),
            source: io::Error::from_raw_os_error(libc::ENODEV),
        });
    }
    if !dir.join("tun_flags").exists() {
        return Err(Error::InterfaceNotFound {
            name: name.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a tun/tap device"),
        });
    }

    let tun_flags = parse_hex(&dir, "tun_flags")?;
    let mode = if tun_flags & (IFF_TAP as u32) != 0 {
        Mode::Tap
    } else if tun_flags & (IFF_TUN as u32) != 0 {
        Mode::Tun
    } else {
        return Err(Error::InterfaceNotFound {
            name: name.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidData, "unknown tun mode"),
        });
    };

    let index = read_attr(&dir, "ifindex")?
        .parse()
        .map_err(|_| invalid(&dir, "ifindex"))?;
    let flags = parse_hex(&dir, "flags")?;

    Ok(TapInfo {
        name: name.to_string(),
        index,
        mode,
        owner: parse_id(&dir, "owner")?,
        group: parse_id(&dir, "group")?,
        persistent: tun_flags & (IFF_PERSIST as u32) != 0,
        no_pi: tun_flags & (IFF_NO_PI as u32) != 0,
        up: flags & (IFF_UP as u32) != 0,
        bridge: fs::read_link(dir.join("brport/bridge"))
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())),
    })
}

/// List every tun/tap interface under `root`, sorted by name.
pub fn list(root: &Path) -> Result<Vec<TapInfo>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(Error::Query {
                path: root.to_path_buf(),
                source,
            });
        }
    };

    let mut devices = Vec::new();
    for entry in entries.flatten() {
        if !entry.path().join("tun_flags").exists() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        match query(root, &IfName::new(&name)) {
            Ok(info) => devices.push(info),
            // Removed between readdir and read
            Err(Error::InterfaceNotFound { .. }) => continue,
            Err(Error::Query { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                continue;
            }
            Err(e) => return Err(e),
        }
    }

    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

fn read_attr(dir: &Path, attr: &str) -> Result<String> {
    let path = dir.join(attr);
    fs::read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|source| Error::Query { path, source })
}

fn parse_hex(dir: &Path, attr: &str) -> Result<u32> {
    let raw = read_attr(dir, attr)?;
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(&raw);
    u32::from_str_radix(digits, 16).map_err(|_| invalid(dir, attr))
}

/// Owner and group read `-1` when unset.
fn parse_id(dir: &Path, attr: &str) -> Result<Option<u32>> {
    let raw = read_attr(dir, attr)?;
    if raw == "-1" {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| invalid(dir, attr))
}

fn invalid(dir: &Path, attr: &str) -> Error {
    Error::Query {
        path: dir.join(attr),
        source: io::Error::new(io::ErrorKind::InvalidData, "unexpected sysfs contents"),
    }
}
