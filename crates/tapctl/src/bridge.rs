//! Bridge port attachment.
//!
//! Bridges are never created here: the ioctl is addressed to an existing
//! bridge by name and the kernel decides whether it accepts the port.

use tracing::info;

use crate::error::{Error, Result};
use crate::ifname::IfName;
use crate::sys::{BridgeControl, System};

/// Make `name` a port of `bridge`.
///
/// The interface must already exist. When it doesn't, no bridge ioctl is
/// issued at all.
pub fn attach<S: System>(sys: &S, name: &IfName, bridge: &IfName) -> Result<()> {
    let socket = sys.open_bridge_socket()?;

    let index = sys
        .name_to_index(name)
        .map_err(|source| Error::InterfaceNotFound {
            name: name.to_string(),
            source,
        })?;

    socket
        .add_interface(bridge, index)
        .map_err(|source| Error::BridgeAttachFailed {
            name: name.to_string(),
            bridge: bridge.to_string(),
            source,
        })?;

    info!(%name, %bridge, index, "attached interface to bridge");
    Ok(())
}
