//! Tap interface lifecycle: create, delete, bridge and up/down.
//!
//! Each operation is a fixed sequence of kernel calls. The first failure
//! aborts the rest of the sequence and whatever the completed steps did to
//! the kernel stays in place; nothing is rolled back or retried. Handles are
//! scoped to the step that needs them and closed by drop on every path.

use std::fmt;

use tracing::{info, warn};

use crate::bridge;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ifname::IfName;
use crate::info::{self, TapInfo};
use crate::ioctl::{IFF_NO_PI, IFF_TAP, IFF_UP};
use crate::sys::{FlagControl, Kernel, System, TapControl};

/// Administrative state of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// `IFF_UP` set.
    Up,
    /// `IFF_UP` cleared.
    Down,
}

impl LinkState {
    /// Apply this state to a set of interface flags.
    ///
    /// Both directions are idempotent: `Down` clears `IFF_UP` rather than
    /// toggling it, so taking a down interface down leaves it down.
    pub fn apply(self, flags: libc::c_short) -> libc::c_short {
        match self {
            LinkState::Up => flags | IFF_UP,
            LinkState::Down => flags & !IFF_UP,
        }
    }

    /// Get the state name.
    pub fn name(&self) -> &'static str {
        match self {
            LinkState::Up => "up",
            LinkState::Down => "down",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Manages persistent tap interfaces.
///
/// # Example
///
/// ```ignore
/// use tapctl::{Config, TapManager};
///
/// let manager = TapManager::new(Config::default());
/// let name = manager.create("tap0", "qemu", "kvm")?;
/// manager.bridge(name.as_str(), "br0")?;
/// manager.delete("tap0")?;
/// ```
#[derive(Debug)]
pub struct TapManager<S: System = Kernel> {
    sys: S,
    config: Config,
}

impl TapManager<Kernel> {
    /// Create a manager talking to the running kernel.
    pub fn new(config: Config) -> Self {
        let sys = Kernel::new(config.tun_device_path());
        Self { sys, config }
    }
}

impl<S: System> TapManager<S> {
    /// Create a manager on top of an arbitrary [`System`].
    pub fn with_system(sys: S, config: Config) -> Self {
        Self { sys, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create a persistent tap interface owned by `user`/`group` and bring
    /// it up.
    ///
    /// Attaches to an existing compatible interface of the same name instead
    /// of failing. Returns the name the kernel used, which reports
    /// [`was_truncated`](IfName::was_truncated) when `name` did not fit.
    pub fn create(&self, name: &str, user: &str, group: &str) -> Result<IfName> {
        let name = bounded(name);

        // Resolve before opening anything so a bad name leaves no trace.
        let uid = self.sys.resolve_user(user)?;
        let gid = self.sys.resolve_group(group)?;

        let actual = {
            let mut channel = self.sys.open_channel()?;
            let actual = channel
                .set_iff(&name, IFF_TAP | IFF_NO_PI)
                .map_err(|e| Error::ioctl("TUNSETIFF", e))?
                .with_truncated(name.was_truncated());
            channel
                .set_owner(uid)
                .map_err(|e| Error::ioctl("TUNSETOWNER", e))?;
            channel
                .set_group(gid)
                .map_err(|e| Error::ioctl("TUNSETGROUP", e))?;
            channel
                .set_persist(true)
                .map_err(|e| Error::ioctl("TUNSETPERSIST", e))?;
            actual
        };

        self.apply_state(&actual, LinkState::Up)?;

        info!(name = %actual, uid, gid, "created persistent tap interface");
        Ok(actual)
    }

    /// Bring a tap interface down and drop its persistence, which removes it
    /// once nothing else holds it open.
    pub fn delete(&self, name: &str) -> Result<()> {
        let name = bounded(name);

        self.apply_state(&name, LinkState::Down)?;

        {
            let mut channel = self.sys.open_channel()?;
            channel
                .set_iff(&name, IFF_TAP)
                .map_err(|e| Error::ioctl("TUNSETIFF", e))?;
            channel
                .set_persist(false)
                .map_err(|e| Error::ioctl("TUNSETPERSIST", e))?;
        }

        info!(%name, "deleted tap interface");
        Ok(())
    }

    /// Attach an existing interface to an existing bridge.
    pub fn bridge(&self, name: &str, bridge_name: &str) -> Result<()> {
        bridge::attach(&self.sys, &bounded(name), &bounded(bridge_name))
    }

    /// Set the administrative state of an interface.
    pub fn set_state(&self, name: &str, state: LinkState) -> Result<()> {
        self.apply_state(&bounded(name), state)?;
        info!(name, %state, "set interface state");
        Ok(())
    }

    /// Read the current state of a tun/tap interface from sysfs.
    pub fn query(&self, name: &str) -> Result<TapInfo> {
        info::query(self.config.sysfs_root_path(), &bounded(name))
    }

    /// List every tun/tap interface known to sysfs.
    pub fn list(&self) -> Result<Vec<TapInfo>> {
        info::list(self.config.sysfs_root_path())
    }

    fn apply_state(&self, name: &IfName, state: LinkState) -> Result<()> {
        let socket = self.sys.open_flag_socket()?;
        let flags = socket
            .flags(name)
            .map_err(|e| Error::ioctl("SIOCGIFFLAGS", e))?;
        socket
            .set_flags(name, state.apply(flags))
            .map_err(|e| Error::ioctl("SIOCSIFFLAGS", e))
    }
}

fn bounded(name: &str) -> IfName {
    let bounded = IfName::new(name);
    if bounded.was_truncated() {
        warn!(requested = name, used = %bounded, "interface name truncated");
    }
    bounded
}
