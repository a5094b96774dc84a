//! Terminal geometry ioctls and raw-mode toggling (spec §4.5, §4.6
//! "Window-size forwarding").

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use nix::sys::termios::{self, SetArg, Termios};

/// Terminal column/row geometry, as carried on the `W` frame
/// (`"W_H"`, spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub cols: u16,
    pub rows: u16,
}

impl WindowSize {
    /// Parses the `W` frame payload `"<cols>_<rows>"`.
    pub fn parse(payload: &str) -> Option<Self> {
        let (cols, rows) = payload.split_once('_')?;
        Some(Self {
            cols: cols.parse().ok()?,
            rows: rows.parse().ok()?,
        })
    }

    /// Renders the `W` frame payload.
    pub fn to_payload(self) -> String {
        format!("{}_{}", self.cols, self.rows)
    }
}

/// Reads the current window size of `fd` via `TIOCGWINSZ`.
pub fn get_window_size(fd: RawFd) -> io::Result<WindowSize> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(WindowSize {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

/// Applies `size` to `fd` via `TIOCSWINSZ` (spec §4.4 "Client→server
/// demux", `W` case).
pub fn set_window_size(fd: RawFd, size: WindowSize) -> io::Result<()> {
    let ws = libc::winsize {
        ws_row: size.rows,
        ws_col: size.cols,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let ret = unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, &ws) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Puts `fd` into raw mode on construction and restores the saved
/// termios state on drop. `OPOST` is kept enabled so that `\n` is still
/// translated to `\r\n` on output, matching spec §4.5's input reader.
pub struct RawModeGuard {
    fd: RawFd,
    saved: Termios,
}

impl RawModeGuard {
    pub fn enable<F: AsRawFd>(target: &F) -> nix::Result<Self> {
        let fd = target.as_raw_fd();
        let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
        let saved = termios::tcgetattr(borrowed)?;
        let mut raw = saved.clone();
        termios::cfmakeraw(&mut raw);
        raw.output_flags.insert(termios::OutputFlags::OPOST);
        termios::tcsetattr(borrowed, SetArg::TCSANOW, &raw)?;
        Ok(Self { fd, saved })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(self.fd) };
        let _ = termios::tcsetattr(borrowed, SetArg::TCSANOW, &self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_size_round_trips_payload() {
        let ws = WindowSize { cols: 80, rows: 24 };
        assert_eq!(ws.to_payload(), "80_24");
        assert_eq!(WindowSize::parse("80_24"), Some(ws));
    }

    #[test]
    fn window_size_parse_rejects_garbage() {
        assert_eq!(WindowSize::parse("nope"), None);
        assert_eq!(WindowSize::parse("80"), None);
    }
}
