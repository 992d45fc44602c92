//! A recording stand-in for the kernel, used by unit tests.
//!
//! Every call made through [`MockSystem`] is appended to a shared log, and
//! every handle logs its own close when dropped, so tests can assert both
//! the ioctl ordering and that nothing is left open on any path.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::ifname::IfName;
use crate::ioctl::IFF_UP;
use crate::sys::{BridgeControl, FlagControl, System, TapControl};

/// Flags of a freshly created tap interface (`IFF_BROADCAST | IFF_MULTICAST`).
pub const NEW_LINK_FLAGS: libc::c_short = 0x1002;

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ResolveUser(String),
    ResolveGroup(String),
    OpenChannel,
    SetIff(String, libc::c_short),
    SetOwner(u32),
    SetGroup(u32),
    SetPersist(bool),
    CloseChannel,
    OpenFlagSocket,
    GetFlags(String),
    SetFlags(String, libc::c_short),
    CloseFlagSocket,
    OpenBridgeSocket,
    NameToIndex(String),
    AddInterface(String, u32),
    CloseBridgeSocket,
}

/// A simulated network interface.
#[derive(Debug, Clone)]
pub struct MockLink {
    pub index: u32,
    pub flags: libc::c_short,
    pub owner: Option<u32>,
    pub group: Option<u32>,
    pub persistent: bool,
    pub bridge: Option<String>,
}

impl MockLink {
    pub fn is_up(&self) -> bool {
        self.flags & IFF_UP != 0
    }
}

#[derive(Debug)]
struct State {
    users: HashMap<String, u32>,
    groups: HashMap<String, u32>,
    links: BTreeMap<String, MockLink>,
    next_index: u32,
    calls: Vec<Call>,
    fail_on: Option<&'static str>,
    control_node: bool,
    bridge_socket: bool,
    open_handles: usize,
}

impl State {
    fn check(&self, op: &'static str) -> io::Result<()> {
        if self.fail_on == Some(op) {
            return Err(io::Error::from_raw_os_error(libc::EPERM));
        }
        Ok(())
    }

    fn add_link(&mut self, name: &str, flags: libc::c_short, persistent: bool) {
        self.next_index += 1;
        self.links.insert(
            name.to_string(),
            MockLink {
                index: self.next_index,
                flags,
                owner: None,
                group: None,
                persistent,
                bridge: None,
            },
        );
    }

    fn link_mut(&mut self, name: &IfName) -> io::Result<&mut MockLink> {
        self.links
            .get_mut(name.as_str())
            .ok_or_else(|| io::Error::from_raw_os_error(libc::ENODEV))
    }
}

/// The simulated host. Clones share state.
#[derive(Debug, Clone)]
pub struct MockSystem {
    state: Rc<RefCell<State>>,
}

impl MockSystem {
    /// A host with `root` (0/0), `lo` and nothing else.
    pub fn new() -> Self {
        let mut state = State {
            users: HashMap::from([("root".to_string(), 0)]),
            groups: HashMap::from([("root".to_string(), 0)]),
            links: BTreeMap::new(),
            next_index: 0,
            calls: Vec::new(),
            fail_on: None,
            control_node: true,
            bridge_socket: true,
            open_handles: 0,
        };
        // IFF_UP | IFF_LOOPBACK | IFF_RUNNING
        state.add_link("lo", 0x49, true);
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn with_user(self, name: &str, uid: u32) -> Self {
        self.state.borrow_mut().users.insert(name.to_string(), uid);
        self
    }

    pub fn with_group(self, name: &str, gid: u32) -> Self {
        self.state.borrow_mut().groups.insert(name.to_string(), gid);
        self
    }

    pub fn with_link(self, name: &str, flags: libc::c_short) -> Self {
        self.state.borrow_mut().add_link(name, flags, true);
        self
    }

    /// Make the named operation fail with `EPERM`.
    pub fn fail_on(self, op: &'static str) -> Self {
        self.state.borrow_mut().fail_on = Some(op);
        self
    }

    pub fn without_control_node(self) -> Self {
        self.state.borrow_mut().control_node = false;
        self
    }

    pub fn without_bridge_socket(self) -> Self {
        self.state.borrow_mut().bridge_socket = false;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn link(&self, name: &str) -> Option<MockLink> {
        self.state.borrow().links.get(name).cloned()
    }

    /// Names of the ports attached to `bridge`.
    pub fn ports_of(&self, bridge: &str) -> Vec<String> {
        self.state
            .borrow()
            .links
            .iter()
            .filter(|(_, l)| l.bridge.as_deref() == Some(bridge))
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Handles opened and not yet dropped.
    pub fn open_handles(&self) -> usize {
        self.state.borrow().open_handles
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn opened(&self, call: Call) {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        state.open_handles += 1;
    }

    fn closed(&self, call: Call) {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        state.open_handles -= 1;
    }
}

impl Default for MockSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MockSystem {
    type Channel = MockChannel;
    type FlagSocket = MockFlagSocket;
    type BridgeSocket = MockBridgeSocket;

    fn resolve_user(&self, name: &str) -> Result<u32> {
        self.record(Call::ResolveUser(name.to_string()));
        self.state
            .borrow()
            .users
            .get(name)
            .copied()
            .ok_or_else(|| Error::UserNotFound {
                name: name.to_string(),
                source: None,
            })
    }

    fn resolve_group(&self, name: &str) -> Result<u32> {
        self.record(Call::ResolveGroup(name.to_string()));
        self.state
            .borrow()
            .groups
            .get(name)
            .copied()
            .ok_or_else(|| Error::GroupNotFound {
                name: name.to_string(),
                source: None,
            })
    }

    fn open_channel(&self) -> Result<MockChannel> {
        if !self.state.borrow().control_node {
            return Err(Error::ControlNodeUnavailable {
                path: crate::TUN_DEVICE_PATH.into(),
                source: io::Error::from_raw_os_error(libc::ENOENT),
            });
        }
        self.opened(Call::OpenChannel);
        Ok(MockChannel {
            sys: self.clone(),
            attached: None,
        })
    }

    fn open_flag_socket(&self) -> Result<MockFlagSocket> {
        self.opened(Call::OpenFlagSocket);
        Ok(MockFlagSocket { sys: self.clone() })
    }

    fn open_bridge_socket(&self) -> Result<MockBridgeSocket> {
        if !self.state.borrow().bridge_socket {
            return Err(Error::BridgeSocketUnavailable {
                source: io::Error::from_raw_os_error(libc::EMFILE),
            });
        }
        self.opened(Call::OpenBridgeSocket);
        Ok(MockBridgeSocket { sys: self.clone() })
    }

    fn name_to_index(&self, name: &IfName) -> io::Result<u32> {
        self.record(Call::NameToIndex(name.to_string()));
        let mut state = self.state.borrow_mut();
        let index = state.link_mut(name)?.index;
        Ok(index)
    }
}

/// Simulated tap control channel. Like the kernel, a device it created
/// disappears on close unless it was made persistent.
#[derive(Debug)]
pub struct MockChannel {
    sys: MockSystem,
    attached: Option<String>,
}

impl TapControl for MockChannel {
    fn set_iff(&mut self, name: &IfName, flags: libc::c_short) -> io::Result<IfName> {
        self.sys.record(Call::SetIff(name.to_string(), flags));
        let mut state = self.sys.state.borrow_mut();
        state.check("TUNSETIFF")?;

        let actual = match name.as_str().find("%d") {
            Some(pos) => {
                let prefix = &name.as_str()[..pos];
                let n = (0..)
                    .find(|n| !state.links.contains_key(&format!("{prefix}{n}")))
                    .unwrap_or(0);
                format!("{prefix}{n}")
            }
            None => name.to_string(),
        };
        if !state.links.contains_key(&actual) {
            state.add_link(&actual, NEW_LINK_FLAGS, false);
        }
        self.attached = Some(actual.clone());
        Ok(IfName::new(&actual))
    }

    fn set_owner(&mut self, uid: u32) -> io::Result<()> {
        self.sys.record(Call::SetOwner(uid));
        self.update("TUNSETOWNER", |link| link.owner = Some(uid))
    }

    fn set_group(&mut self, gid: u32) -> io::Result<()> {
        self.sys.record(Call::SetGroup(gid));
        self.update("TUNSETGROUP", |link| link.group = Some(gid))
    }

    fn set_persist(&mut self, persist: bool) -> io::Result<()> {
        self.sys.record(Call::SetPersist(persist));
        self.update("TUNSETPERSIST", |link| link.persistent = persist)
    }
}

impl MockChannel {
    fn update(&self, op: &'static str, f: impl FnOnce(&mut MockLink)) -> io::Result<()> {
        let mut state = self.sys.state.borrow_mut();
        state.check(op)?;
        let name = self
            .attached
            .as_deref()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADFD))?;
        let link = state
            .links
            .get_mut(name)
            .ok_or_else(|| io::Error::from_raw_os_error(libc::ENODEV))?;
        f(link);
        Ok(())
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        if let Some(name) = self.attached.take() {
            let mut state = self.sys.state.borrow_mut();
            if state.links.get(&name).is_some_and(|l| !l.persistent) {
                state.links.remove(&name);
            }
        }
        self.sys.closed(Call::CloseChannel);
    }
}

/// Simulated flag socket.
#[derive(Debug)]
pub struct MockFlagSocket {
    sys: MockSystem,
}

impl FlagControl for MockFlagSocket {
    fn flags(&self, name: &IfName) -> io::Result<libc::c_short> {
        self.sys.record(Call::GetFlags(name.to_string()));
        let mut state = self.sys.state.borrow_mut();
        state.check("SIOCGIFFLAGS")?;
        let flags = state.link_mut(name)?.flags;
        Ok(flags)
    }

    fn set_flags(&self, name: &IfName, flags: libc::c_short) -> io::Result<()> {
        self.sys.record(Call::SetFlags(name.to_string(), flags));
        let mut state = self.sys.state.borrow_mut();
        state.check("SIOCSIFFLAGS")?;
        state.link_mut(name)?.flags = flags;
        Ok(())
    }
}

impl Drop for MockFlagSocket {
    fn drop(&mut self) {
        self.sys.closed(Call::CloseFlagSocket);
    }
}

/// Simulated bridge socket.
#[derive(Debug)]
pub struct MockBridgeSocket {
    sys: MockSystem,
}

impl BridgeControl for MockBridgeSocket {
    fn add_interface(&self, bridge: &IfName, index: u32) -> io::Result<()> {
        self.sys.record(Call::AddInterface(bridge.to_string(), index));
        let mut state = self.sys.state.borrow_mut();
        state.check("SIOCBRADDIF")?;
        if !state.links.contains_key(bridge.as_str()) {
            return Err(io::Error::from_raw_os_error(libc::ENODEV));
        }
        let port = state
            .links
            .values_mut()
            .find(|l| l.index == index)
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EINVAL))?;
        port.bridge = Some(bridge.to_string());
        Ok(())
    }
}

impl Drop for MockBridgeSocket {
    fn drop(&mut self) {
        self.sys.closed(Call::CloseBridgeSocket);
    }
}
