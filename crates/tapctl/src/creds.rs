//! User and group name resolution.
//!
//! Uses the reentrant `getpwnam_r`/`getgrnam_r` lookups so tests running on
//! several threads never share the static passwd buffer.

use std::ffi::CString;
use std::io;

use crate::error::{Error, Result};

const INITIAL_BUF: usize = 1024;
const MAX_BUF: usize = 1 << 20;

/// Look up a user by name and return the UID.
pub fn resolve_user(name: &str) -> Result<u32> {
    let not_found = |source| Error::UserNotFound {
        name: name.to_string(),
        source,
    };
    let Ok(c_name) = CString::new(name) else {
        return Err(not_found(None));
    };

    let mut buf = vec![0 as libc::c_char; INITIAL_BUF];
    loop {
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        let ret = unsafe {
            libc::getpwnam_r(
                c_name.as_ptr(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        match lookup_outcome(ret, result.is_null(), &mut buf) {
            Outcome::Retry => continue,
            Outcome::Found => return Ok(pwd.pw_uid),
            Outcome::Missing(source) => return Err(not_found(source)),
        }
    }
}

/// Look up a group by name and return the GID.
pub fn resolve_group(name: &str) -> Result<u32> {
    let not_found = |source| Error::GroupNotFound {
        name: name.to_string(),
        source,
    };
    let Ok(c_name) = CString::new(name) else {
        return Err(not_found(None));
    };

    let mut buf = vec![0 as libc::c_char; INITIAL_BUF];
    loop {
        let mut grp: libc::group = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::group = std::ptr::null_mut();
        let ret = unsafe {
            libc::getgrnam_r(
                c_name.as_ptr(),
                &mut grp,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        match lookup_outcome(ret, result.is_null(), &mut buf) {
            Outcome::Retry => continue,
            Outcome::Found => return Ok(grp.gr_gid),
            Outcome::Missing(source) => return Err(not_found(source)),
        }
    }
}

enum Outcome {
    Retry,
    Found,
    Missing(Option<io::Error>),
}

fn lookup_outcome(ret: libc::c_int, missing: bool, buf: &mut Vec<libc::c_char>) -> Outcome {
    if ret == libc::ERANGE && buf.len() < MAX_BUF {
        let len = buf.len() * 2;
        buf.resize(len, 0);
        return Outcome::Retry;
    }
    if ret != 0 {
        return Outcome::Missing(Some(io::Error::from_raw_os_error(ret)));
    }
    if missing {
        return Outcome::Missing(None);
    }
    Outcome::Found
}
