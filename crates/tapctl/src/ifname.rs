//! Interface name and index utilities.

use std::ffi::CStr;
use std::fmt;
use std::io;

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = libc::IFNAMSIZ;

/// An interface name bounded to the kernel's fixed-size name field.
///
/// The kernel keeps at most `IFNAMSIZ - 1` bytes of a name. Longer input is
/// cut deterministically (at the first NUL, then at the last character
/// boundary that fits) and the result remembers that it was cut, so callers
/// can tell before the kernel silently does the same thing.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IfName {
    buf: [u8; IFNAMSIZ],
    len: usize,
    truncated: bool,
}

impl IfName {
    /// Build a name, truncating anything the kernel would not keep.
    pub fn new(name: &str) -> Self {
        let (head, mut truncated) = match name.find('\0') {
            Some(pos) => (&name[..pos], true),
            None => (name, false),
        };

        let mut len = head.len();
        if len > IFNAMSIZ - 1 {
            truncated = true;
            len = IFNAMSIZ - 1;
            while !head.is_char_boundary(len) {
                len -= 1;
            }
        }

        let mut buf = [0u8; IFNAMSIZ];
        buf[..len].copy_from_slice(&head.as_bytes()[..len]);

        Self {
            buf,
            len,
            truncated,
        }
    }

    /// Build a name from a kernel-filled `ifr_name` field.
    pub(crate) fn from_raw(raw: &[libc::c_char; IFNAMSIZ]) -> Self {
        let bytes: [u8; IFNAMSIZ] = raw.map(|c| c as u8);
        let len = bytes.iter().position(|&c| c == 0).unwrap_or(IFNAMSIZ);
        Self::new(&String::from_utf8_lossy(&bytes[..len]))
    }

    /// The (possibly truncated) name.
    pub fn as_str(&self) -> &str {
        // Only ever filled from a `&str` prefix that ends on a char boundary.
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    /// The name as a NUL-terminated C string.
    pub fn as_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.buf).unwrap_or_default()
    }

    /// Whether the input was longer than the kernel keeps.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// Length of the kept name in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the name is empty (the kernel then picks one).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Carry over a truncation that happened before the kernel saw the name.
    pub(crate) fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated |= truncated;
        self
    }

    /// Copy the name into an `ifr_name` field.
    pub(crate) fn to_raw(&self) -> [libc::c_char; IFNAMSIZ] {
        self.buf.map(|b| b as libc::c_char)
    }
}

impl fmt::Display for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IfName")
            .field("name", &self.as_str())
            .field("truncated", &self.truncated)
            .finish()
    }
}

impl From<&str> for IfName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for IfName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Convert an interface name to index.
///
/// Never creates anything; a missing interface is an error carrying the
/// kernel's errno (usually `ENODEV`).
pub fn name_to_index(name: &IfName) -> io::Result<u32> {
    let index = unsafe { libc::if_nametoindex(name.as_c_str().as_ptr()) };
    if index == 0 {
        let err = io::Error::last_os_error();
        // if_nametoindex may leave errno untouched on a plain miss
        return Err(match err.raw_os_error() {
            Some(0) | None => io::Error::from_raw_os_error(libc::ENODEV),
            Some(_) => err,
        });
    }
    Ok(index)
}
