//! Signal-by-pid
//!
//! The only way a backing server is ever stopped. A pid may come from a
//! snapshot written before the host restarted, so nothing here relies on a
//! retained child handle.

use crate::error::ProcessError;
use crate::Result;

pub trait ProcessSignaller: Send + Sync {
    /// Send SIGHUP to the process group led by `pid`.
    fn hang_up_group(&self, pid: u32) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSignaller;

impl ProcessSignaller for SystemSignaller {
    #[cfg(unix)]
    fn hang_up_group(&self, pid: u32) -> Result<()> {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let raw = checked_pid(pid)?;
        killpg(Pid::from_raw(raw), Signal::SIGHUP).map_err(|e| ProcessError::Signal {
            pid,
            reason: e.to_string(),
        })
    }

    #[cfg(not(unix))]
    fn hang_up_group(&self, pid: u32) -> Result<()> {
        Err(ProcessError::Signal {
            pid,
            reason: "process groups are not supported on this platform".to_string(),
        })
    }
}

/// Whether `pid` names a live process. Zombies count as gone.
pub(crate) fn is_running(pid: u32) -> bool {
    match checked_pid(pid) {
        Ok(raw) => pid_alive(raw),
        Err(_) => false,
    }
}

#[cfg(target_os = "linux")]
fn pid_alive(raw: i32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", raw)) {
        Ok(stat) => process_state(&stat).map_or(true, |state| state != 'Z'),
        Err(_) => signal_zero(raw),
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn pid_alive(raw: i32) -> bool {
    signal_zero(raw)
}

#[cfg(not(unix))]
fn pid_alive(_raw: i32) -> bool {
    true
}

/// Signal 0: existence check only. EPERM still means the pid exists.
#[cfg(unix)]
fn signal_zero(raw: i32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    !matches!(kill(Pid::from_raw(raw), None), Err(Errno::ESRCH))
}

/// State letter from a `/proc/<pid>/stat` line; the command name may hold
/// spaces and parentheses, so parse after the last `)`.
#[cfg(target_os = "linux")]
pub(crate) fn process_state(stat: &str) -> Option<char> {
    stat.rsplit_once(')')?.1.trim_start().chars().next()
}

/// pid 0 would address our own group, and values past i32::MAX wrap negative.
fn checked_pid(pid: u32) -> Result<i32> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 1 => Ok(raw),
        _ => Err(ProcessError::Signal {
            pid,
            reason: "not a signalable pid".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_pids_are_rejected() {
        assert!(checked_pid(0).is_err());
        assert!(checked_pid(1).is_err());
        assert!(checked_pid(u32::MAX).is_err());
        assert_eq!(checked_pid(4242).unwrap(), 4242);
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_to_missing_group_fails() {
        // a reaped child leaves no process group behind
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        let result = SystemSignaller.hang_up_group(pid);
        assert!(matches!(result, Err(ProcessError::Signal { pid: p, .. }) if p == pid));
        assert!(!is_running(pid));
    }

    #[test]
    fn test_reserved_pids_are_never_signalled() {
        let result = SystemSignaller.hang_up_group(0);
        assert!(matches!(result, Err(ProcessError::Signal { pid: 0, .. })));
        assert!(!is_running(0));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_state_parsing() {
        assert_eq!(process_state("4242 (php) S 1 4242 4242 0"), Some('S'));
        assert_eq!(process_state("4242 (a) (b)) Z 1 4242"), Some('Z'));
        assert_eq!(process_state("garbage"), None);
        assert!(is_running(std::process::id()));
    }
}
