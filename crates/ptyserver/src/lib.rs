//! The server-side PTY manager (spec §2.5, §4.4): forks `/bin/bash`
//! under a pseudo-terminal, relays it over the framed transport, and
//! hosts the `FileServer` worker.

mod cwd;
mod error;
mod pty;
mod relay;

pub use cwd::{ProcCwdProvider, ShellCwdProvider};
pub use error::ServerError;
pub use pty::PtySession;
pub use relay::run;

use std::io::{self, Write};

use frame::{FrameReader, FrameWriter};

const BANNER: &str = "ssh server started";

/// The `--server` entry point: writes the banner line, then switches
/// stdin/stdout into framed mode and runs the session (spec §4.4 "On
/// start, the server writes a literal banner line").
pub fn serve() -> Result<(), ServerError> {
    println!("{BANNER}");
    io::stdout().flush().map_err(|e| ServerError::io("flush banner", e))?;

    let start_dir = std::env::current_dir().map_err(|e| ServerError::io("getcwd", e))?;
    let reader = FrameReader::new(io::stdin());
    let writer = FrameWriter::new(io::stdout());
    run(reader, writer, start_dir)
}
