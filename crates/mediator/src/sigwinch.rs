//! Window-size forwarding (spec §4.5 "Window-size forwarding", §5
//! "SIGWINCH handler (short; only enqueues a W frame write)").

use std::io::Write;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use frame::{FrameKind, FrameWriter};
use nix::sys::signal::{self, SigHandler, Signal};

use crate::error::MediatorError;

static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigwinch(_sig: i32) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

/// Installs the SIGWINCH handler and spawns a lightweight thread that
/// notices the flag and writes a `W` frame — the handler itself only
/// ever touches an atomic, never the transport.
pub fn install<W>(stdin_fd: RawFd, writer: Arc<FrameWriter<W>>) -> Result<(), MediatorError>
where
    W: Write + Send + Sync + 'static,
{
    unsafe {
        signal::signal(Signal::SIGWINCH, SigHandler::Handler(handle_sigwinch))
            .map_err(|e| MediatorError::nix("install SIGWINCH handler", e))?;
    }

    send_window_size(stdin_fd, &writer);

    thread::spawn(move || loop {
        if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
            send_window_size(stdin_fd, &writer);
        }
        thread::sleep(Duration::from_millis(50));
    });

    Ok(())
}

fn send_window_size<W: Write>(stdin_fd: RawFd, writer: &FrameWriter<W>) {
    if let Ok(size) = util::term::get_window_size(stdin_fd) {
        let _ = writer.write_frame(FrameKind::WindowResize, size.to_payload().as_bytes());
    }
}
