//! Kernel query client: fetches the raw TCP or UDP PCB table using the
//! two-phase (size probe, then fetch) sysctl protocol.

use std::io;

use libc::c_int;
use log::debug;
use thiserror::Error;

use crate::{bindings::pcb_uapi::*, events::Protocol};

/// Failure kinds of a PCB table query. All of them are fatal to the
/// current sampling tick; there is no retry.
#[derive(Debug, Error)]
pub(crate) enum QueryError {
    #[error("size probe failed: {0}")]
    SizeProbe(#[source] io::Error),
    #[error("could not allocate a {0} bytes query buffer")]
    Alloc(usize),
    #[error("data fetch failed: {0}")]
    Fetch(#[source] io::Error),
}

/// Key path selecting a protocol's PCB list in the kernel network-control
/// namespace.
fn mib(protocol: Protocol) -> [c_int; 4] {
    match protocol {
        Protocol::Tcp => [CTL_NET, PF_INET, IPPROTO_TCP, TCPCTL_PCBLIST],
        Protocol::Udp => [CTL_NET, PF_INET, IPPROTO_UDP, UDPCTL_PCBLIST],
    }
}

/// Query the live PCB table for a protocol and return the raw record
/// chain. Only works on kernels exposing the BSD-style PCB enumeration
/// facility; elsewhere the underlying call reports `ENOSYS`.
pub(crate) fn query(protocol: Protocol) -> Result<Vec<u8>, QueryError> {
    query_with(protocol, os::sysctl_raw)
}

fn query_with<F>(protocol: Protocol, raw: F) -> Result<Vec<u8>, QueryError>
where
    F: Fn(&mut [c_int; 4], Option<&mut [u8]>) -> io::Result<usize>,
{
    let mut mib = mib(protocol);

    // First probe the required buffer size with a null destination.
    let hint = raw(&mut mib, None).map_err(QueryError::SizeProbe)?;
    debug!("{protocol} table size probe: {hint} bytes");

    let mut buf = Vec::new();
    if buf.try_reserve_exact(hint).is_err() {
        return Err(QueryError::Alloc(hint));
    }
    buf.resize(hint, 0);

    // Then fetch the table. It can shrink between the two calls, making
    // the size returned here the authoritative one, not the probed hint.
    let len = raw(&mut mib, Some(&mut buf[..])).map_err(QueryError::Fetch)?;
    buf.truncate(len);

    Ok(buf)
}

mod os {
    use std::io;

    use libc::c_int;

    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    pub(super) fn sysctl_raw(mib: &mut [c_int; 4], buf: Option<&mut [u8]>) -> io::Result<usize> {
        let (ptr, mut len) = match buf {
            Some(buf) => (buf.as_mut_ptr().cast(), buf.len()),
            None => (std::ptr::null_mut(), 0),
        };

        let ret = unsafe {
            libc::sysctl(
                mib.as_mut_ptr(),
                mib.len() as libc::c_uint,
                ptr,
                &mut len,
                std::ptr::null_mut(),
                0,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(len)
    }

    #[cfg(not(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    )))]
    pub(super) fn sysctl_raw(_: &mut [c_int; 4], _: Option<&mut [u8]>) -> io::Result<usize> {
        Err(io::Error::from_raw_os_error(libc::ENOSYS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_failure() {
        let res = query_with(Protocol::Tcp, |_, buf| {
            assert!(buf.is_none(), "size probe failure must not lead to a fetch");
            Err(io::Error::from_raw_os_error(libc::EPERM))
        });
        assert!(matches!(res, Err(QueryError::SizeProbe(_))));
    }

    #[test]
    fn fetch_failure() {
        let res = query_with(Protocol::Udp, |_, buf| match buf {
            None => Ok(128),
            Some(_) => Err(io::Error::from_raw_os_error(libc::ENOMEM)),
        });
        assert!(matches!(res, Err(QueryError::Fetch(_))));
    }

    #[test]
    fn fetch_size_is_authoritative() {
        // The table shrank between the probe and the fetch: the caller
        // must see the fetched length, not the probed one.
        let res = query_with(Protocol::Tcp, |_, buf| match buf {
            None => Ok(128),
            Some(buf) => {
                assert_eq!(buf.len(), 128);
                buf[..64].fill(0xaa);
                Ok(64)
            }
        });
        let buf = res.unwrap();
        assert_eq!(buf.len(), 64);
        assert!(buf.iter().all(|&b| b == 0xaa));
    }
}
