//! Forks `/bin/bash` under a pseudo-terminal (spec §4.4 "On start...
//! forks a child under a pseudo-terminal").

use std::ffi::CString;
use std::fs::File;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, RawFd};

use nix::pty::{openpty, OpenptyResult};
use nix::unistd::{dup2, execvp, fork, setsid, ForkResult, Pid};

use crate::error::ServerError;

const SHELL: &str = "/bin/bash";

/// The server's half of a forked PTY session: the master side, and the
/// pid of the forked child (which execs the shell directly).
pub struct PtySession {
    pub master: File,
    pub child: Pid,
}

impl PtySession {
    /// Opens a PTY pair and forks; the child becomes session leader,
    /// acquires the slave as its controlling terminal, and execs
    /// [`SHELL`]. The parent keeps the master end.
    pub fn spawn() -> Result<Self, ServerError> {
        let OpenptyResult { master, slave } = openpty(None, None).map_err(|e| ServerError::nix("openpty", e))?;
        let master_fd = master.as_raw_fd();
        let slave_fd = slave.as_raw_fd();

        match unsafe { fork() }.map_err(|e| ServerError::nix("fork", e))? {
            ForkResult::Child => {
                drop(master);
                let _ = setsid();
                unsafe {
                    libc::ioctl(slave_fd, libc::TIOCSCTTY as _, 0);
                }
                let _ = dup2(slave_fd, libc::STDIN_FILENO);
                let _ = dup2(slave_fd, libc::STDOUT_FILENO);
                let _ = dup2(slave_fd, libc::STDERR_FILENO);
                if slave_fd > libc::STDERR_FILENO {
                    drop(slave);
                } else {
                    let _ = slave.into_raw_fd();
                }

                let shell = CString::new(SHELL).expect("SHELL has no interior NUL");
                let args = [shell.clone()];
                let _ = execvp(&shell, &args);
                // execvp only returns on failure.
                std::process::exit(127);
            }
            ForkResult::Parent { child } => {
                drop(slave);
                let master_file = unsafe { File::from_raw_fd(master_fd) };
                std::mem::forget(master); // ownership now held by master_file
                Ok(Self {
                    master: master_file,
                    child,
                })
            }
        }
    }

    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// A second handle to the master side, for the reader thread; reads
    /// and writes on a duplicated fd do not race each other since a PTY
    /// has independent input/output queues.
    pub fn try_clone_master(&self) -> std::io::Result<File> {
        self.master.try_clone()
    }
}
