//! Shell cwd discovery (spec §4.4 "Shell cwd discovery", §9 Open
//! Question: the `/proc` lookup is Linux-only; this is abstracted
//! behind [`ShellCwdProvider`] so a portable reimplementation only
//! needs a new provider, not a rewrite of the demuxer).

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use nix::unistd::Pid;

/// Resolves the current working directory of the interactive shell
/// running under the PTY.
pub trait ShellCwdProvider: Send + Sync {
    fn shell_cwd(&self, pty_child: Pid) -> std::io::Result<PathBuf>;
}

/// Finds the descendant of `pty_child` (the shell itself, since the PTY
/// child execs the shell directly — but kept general in case a wrapper
/// intervenes) by scanning `/proc/*/stat` for a matching `ppid`, then
/// reads `/proc/<pid>/cwd`. The discovered pid is cached after the first
/// lookup, per spec.
pub struct ProcCwdProvider {
    cached_pid: Mutex<Option<i32>>,
}

impl ProcCwdProvider {
    pub fn new() -> Self {
        Self {
            cached_pid: Mutex::new(None),
        }
    }

    fn find_shell_pid(&self, pty_child: Pid) -> std::io::Result<i32> {
        let parent = pty_child.as_raw();
        for entry in fs::read_dir("/proc")? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(pid) = name.to_str().and_then(|s| s.parse::<i32>().ok()) else {
                continue;
            };
            let stat_path = format!("/proc/{pid}/stat");
            let Ok(stat) = fs::read_to_string(&stat_path) else {
                continue;
            };
            // Field 4 is ppid; field 2 (comm) may itself contain spaces
            // inside parentheses, so split after the closing paren.
            let Some(after_comm) = stat.rsplit_once(')') else {
                continue;
            };
            let fields: Vec<&str> = after_comm.1.split_whitespace().collect();
            if let Some(ppid_str) = fields.get(1) {
                if ppid_str.parse::<i32>() == Ok(parent) {
                    return Ok(pid);
                }
            }
        }
        if pty_child.as_raw() > 0 {
            return Ok(pty_child.as_raw());
        }
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no shell descendant of pty child"))
    }
}

impl Default for ProcCwdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellCwdProvider for ProcCwdProvider {
    fn shell_cwd(&self, pty_child: Pid) -> std::io::Result<PathBuf> {
        let pid = {
            let mut cached = self.cached_pid.lock().unwrap();
            match *cached {
                Some(pid) => pid,
                None => {
                    let pid = self.find_shell_pid(pty_child)?;
                    *cached = Some(pid);
                    pid
                }
            }
        };
        fs::read_link(format!("/proc/{pid}/cwd"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_the_pty_child_itself_when_no_descendant_is_found() {
        let provider = ProcCwdProvider::new();
        let cwd = provider.shell_cwd(Pid::this()).unwrap();
        assert_eq!(cwd, std::env::current_dir().unwrap());
    }

    #[test]
    fn caches_pid_after_first_lookup() {
        let provider = ProcCwdProvider::new();
        provider.shell_cwd(Pid::this()).unwrap();
        assert_eq!(*provider.cached_pid.lock().unwrap(), Some(Pid::this().as_raw()));
    }
}
