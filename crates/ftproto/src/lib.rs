//! The file-transfer line protocol: `FileClient`/`FileServer`, the
//! `key: value` line grammar, and directory listing helpers (spec §3,
//! §4.2, §4.3).

mod client;
mod error;
mod line;
mod listing;
mod server;

pub use client::{list_local_dir, FileClient, FileInbox, CHUNK_SIZE};
pub use error::{OperationError, ProtocolError};
pub use line::{expect_key, format_line, parse_line};
pub use listing::{list_dir, possible_paths, DirListing};
pub use server::FileServer;
