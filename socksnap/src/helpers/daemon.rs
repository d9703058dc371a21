/// # Daemon
///
/// Detaches the process from its controlling terminal using the classic
/// fork + setsid sequence, so the sampling loop can run as a background
/// task.
use std::{fs::File, os::fd::AsRawFd, process};

use anyhow::{Context, Result};
use nix::{
    sys::stat::{umask, Mode},
    unistd::{chdir, dup2, fork, setsid, ForkResult},
};

/// Turn the current process into a daemon. Must be called before any
/// thread is spawned, as only the forking thread survives in the child.
pub(crate) fn daemonize() -> Result<()> {
    // SAFETY: single-threaded at this point, no locks can be left held
    // across the fork.
    match unsafe { fork() }.context("could not fork")? {
        ForkResult::Parent { .. } => process::exit(0),
        ForkResult::Child => (),
    }

    umask(Mode::empty());
    setsid().context("could not create a new session")?;
    chdir("/").context("could not chdir to /")?;

    // Detach stdio from the terminal. Anything logged from now on is
    // discarded.
    let null = File::options()
        .read(true)
        .write(true)
        .open("/dev/null")
        .context("could not open /dev/null")?;
    for fd in 0..=2 {
        dup2(null.as_raw_fd(), fd).with_context(|| format!("could not redirect fd {fd}"))?;
    }

    Ok(())
}
