//! External process introspection: the only OS-process queries
//! the core performs, each keyed by PID. Grounded on `/proc` the way
//! DataDog-libdatadog's `unix_utils` reads `/proc/self/status` directly
//! instead of pulling in a process-enumeration crate — a target PID's
//! executable and working directory are both already exposed as symlinks
//! under `/proc/<pid>`, so no extra dependency is needed for this boundary.

use std::path::PathBuf;

use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Whether a process with this PID currently exists. Uses `kill(pid, 0)`
/// rather than statting `/proc/<pid>` so the check also works on the BSDs
/// the crate doesn't target today, and to visibly depend on `nix`, which
/// the rest of session handling already uses for subprocess signalling.
pub fn exists(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Absolute path to the executable backing `pid`, or `None` if the
/// process is gone or the link can't be read (permissions, zombie state).
pub fn guess_executable(pid: u32) -> Option<PathBuf> {
    std::fs::read_link(format!("/proc/{pid}/exe")).ok()
}

/// Absolute path to the current working directory of `pid`, or `None`
/// under the same conditions as [`guess_executable`].
pub fn guess_context_dir(pid: u32) -> Option<PathBuf> {
    std::fs::read_link(format!("/proc/{pid}/cwd")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_exists_and_resolves() {
        let pid = std::process::id();
        assert!(exists(pid));
        assert!(guess_executable(pid).is_some());
        assert!(guess_context_dir(pid).is_some());
    }

    #[test]
    fn an_unlikely_pid_does_not_exist() {
        // PID 1 always exists; a PID far past any realistic pid_max doesn't.
        assert!(!exists(u32::MAX));
    }
}
