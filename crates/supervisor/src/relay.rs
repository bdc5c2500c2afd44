//! Signal delivery to the child and its process group
//!
//! The child is spawned as leader of its own process group, so the group id
//! equals its pid and `kill(-pid, sig)` reaches every descendant. Each send is
//! best effort: failures are logged and never retried.

use crate::HandledSignal;
use std::io;
use tracing::{debug, warn};

/// Forward `signal` to the process group, then to the process itself.
///
/// Both sends are attempted even if the first one fails.
pub fn forward_signal(pid: u32, signal: HandledSignal) {
    if let Err(e) = send_to_group(pid, signal.as_raw()) {
        warn!(pid, %signal, error = %e, "Failed to signal process group");
    }
    if let Err(e) = send_to_process(pid, signal.as_raw()) {
        warn!(pid, %signal, error = %e, "Failed to signal process");
    }
}

/// Send `SIGKILL` to the process and its group.
///
/// Targets that are already gone are not an error.
pub fn force_kill(pid: u32) {
    match send_to_process(pid, libc::SIGKILL) {
        Err(e) if e.raw_os_error() != Some(libc::ESRCH) => {
            warn!(pid, error = %e, "Failed to SIGKILL process");
        }
        Err(_) => debug!(pid, "Process already gone"),
        Ok(()) => {}
    }
    match send_to_group(pid, libc::SIGKILL) {
        Err(e) if e.raw_os_error() != Some(libc::ESRCH) => {
            warn!(pid, error = %e, "Failed to SIGKILL process group");
        }
        Err(_) => debug!(pid, "Process group already gone"),
        Ok(()) => {}
    }
}

fn send_to_process(pid: u32, signal: i32) -> io::Result<()> {
    kill(to_pid(pid)?, signal)
}

fn send_to_group(pid: u32, signal: i32) -> io::Result<()> {
    kill(-to_pid(pid)?, signal)
}

fn to_pid(pid: u32) -> io::Result<libc::pid_t> {
    match libc::pid_t::try_from(pid) {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid pid {pid}"),
        )),
    }
}

fn kill(target: libc::pid_t, signal: i32) -> io::Result<()> {
    // SAFETY: kill(2) takes plain integers and has no memory-safety
    // preconditions. A negative target addresses the process group.
    #[expect(unsafe_code, reason = "Required for POSIX signal delivery")]
    let rc = unsafe { libc::kill(target, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
