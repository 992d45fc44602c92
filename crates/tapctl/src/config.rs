//! Host-specific settings.

use std::path::{Path, PathBuf};

/// Where to find the kernel interfaces and who owns new devices by default.
#[derive(Debug, Clone)]
pub struct Config {
    tun_device: PathBuf,
    sysfs_root: PathBuf,
    default_user: String,
    default_group: String,
}

impl Config {
    /// Create a configuration with the standard Linux paths.
    pub fn new() -> Self {
        Self {
            tun_device: PathBuf::from(crate::TUN_DEVICE_PATH),
            sysfs_root: PathBuf::from(crate::SYSFS_NET_PATH),
            default_user: crate::DEFAULT_OWNER.to_string(),
            default_group: crate::DEFAULT_OWNER.to_string(),
        }
    }

    /// Set the tap control node path.
    pub fn tun_device(mut self, path: impl Into<PathBuf>) -> Self {
        self.tun_device = path.into();
        self
    }

    /// Set the sysfs directory that lists network interfaces.
    pub fn sysfs_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.sysfs_root = path.into();
        self
    }

    /// Set the owner used when `create` is given no user.
    pub fn default_user(mut self, user: impl Into<String>) -> Self {
        self.default_user = user.into();
        self
    }

    /// Set the group used when `create` is given no group.
    pub fn default_group(mut self, group: impl Into<String>) -> Self {
        self.default_group = group.into();
        self
    }

    /// Get the tap control node path.
    pub fn tun_device_path(&self) -> &Path {
        &self.tun_device
    }

    /// Get the sysfs network directory.
    pub fn sysfs_root_path(&self) -> &Path {
        &self.sysfs_root
    }

    /// Get the default owner user name.
    pub fn default_user_name(&self) -> &str {
        &self.default_user
    }

    /// Get the default owner group name.
    pub fn default_group_name(&self) -> &str {
        &self.default_group
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
