//! The server's three threads (spec §4.4, §5 "Threads on the server"):
//! PTY reader, main demuxer, and the `FileServer` worker.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use frame::{FrameKind, FrameReader, FrameWriter};
use ftproto::FileServer;
use nix::sys::signal::{self, Signal};

use crate::cwd::{ProcCwdProvider, ShellCwdProvider};
use crate::error::ServerError;
use crate::pty::PtySession;

const PTY_READ_CHUNK: usize = 4096;

/// Runs the server session to completion: forks a shell under a PTY and
/// relays it over `reader`/`writer` until an `E` frame, a transport
/// error, or PTY EOF ends the session.
pub fn run<R, W>(mut reader: FrameReader<R>, writer: FrameWriter<W>, start_dir: PathBuf) -> Result<(), ServerError>
where
    R: Read + Send + 'static,
    W: Write + Send + Sync + 'static,
{
    let mut pty = PtySession::spawn()?;
    let writer = Arc::new(writer);

    let pty_reader = pty.try_clone_master().map_err(|e| ServerError::io("clone pty master", e))?;
    spawn_pty_reader(pty_reader, Arc::clone(&writer));

    let (file_tx, file_rx) = mpsc::channel::<Vec<u8>>();
    spawn_file_server(Arc::clone(&writer), start_dir.clone(), file_rx);

    let cwd_provider = ProcCwdProvider::new();

    loop {
        let (kind, payload) = match reader.read_frame() {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "framed transport error, tearing down session");
                return Err(e.into());
            }
        };
        match kind {
            FrameKind::Terminal => {
                if pty.master.write_all(&payload).is_err() {
                    break;
                }
            }
            FrameKind::WindowResize => {
                let text = String::from_utf8_lossy(&payload);
                if let Some(size) = util::term::WindowSize::parse(&text) {
                    let _ = util::term::set_window_size(pty.master_fd(), size);
                }
            }
            FrameKind::FileTransfer => {
                if file_tx.send(payload).is_err() {
                    break;
                }
            }
            FrameKind::Sync => {
                let cwd = cwd_provider.shell_cwd(pty.child).unwrap_or_else(|_| start_dir.clone());
                let _ = std::env::set_current_dir(&cwd);
                let _ = writer.write_frame(FrameKind::Sync, cwd.to_string_lossy().as_bytes());
            }
            FrameKind::End => {
                let _ = signal::kill(pty.child, Signal::SIGTERM);
                break;
            }
        }
    }

    Ok(())
}

fn spawn_pty_reader<W>(mut pty_read: std::fs::File, writer: Arc<FrameWriter<W>>)
where
    W: Write + Send + Sync + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; PTY_READ_CHUNK];
        loop {
            match pty_read.read(&mut buf) {
                Ok(0) => {
                    let _ = writer.write_frame(FrameKind::End, b"");
                    break;
                }
                Ok(n) => {
                    if writer.write_frame(FrameKind::Terminal, &buf[..n]).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    let _ = writer.write_frame(FrameKind::End, b"");
                    break;
                }
            }
        }
    });
}

/// Runs the `FileServer` worker, blocking on `file_rx` for its line
/// input (spec §4.4 "The FileServer runs in its own thread, blocking on
/// the inbound queue") and writing replies through the same shared
/// write-side mutex the PTY reader uses.
fn spawn_file_server<W>(writer: Arc<FrameWriter<W>>, start_dir: PathBuf, file_rx: mpsc::Receiver<Vec<u8>>)
where
    W: Write + Send + Sync + 'static,
{
    thread::spawn(move || {
        let mut server = FileServer::new(writer, start_dir);
        loop {
            let first = match file_rx.recv() {
                Ok(line) => line,
                Err(_) => break,
            };
            let first_line = String::from_utf8_lossy(&first).into_owned();
            let mut read_line = || -> Result<String, ftproto::ProtocolError> {
                let payload = file_rx.recv().map_err(|_| ftproto::ProtocolError::ChannelClosed)?;
                Ok(String::from_utf8_lossy(&payload).into_owned())
            };
            match server.handle_line(&first_line, &mut read_line) {
                Ok(true) => {}
                Ok(false) | Err(_) => break,
            }
        }
    });
}
