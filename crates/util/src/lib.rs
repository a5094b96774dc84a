//! Shared low-level helpers for the ssh2 client and server.
//!
//! Everything here is leaf-level: no networking, no threads, no knowledge
//! of the framed transport or the file-transfer protocol. Higher crates
//! (`frame`, `ftproto`, `ptyserver`, `mediator`) build on top of this one.

pub mod config;
pub mod hex;
pub mod path;
pub mod probe;
pub mod term;

pub use config::{load_config, Config};
pub use probe::{FileAttr, FileAttrSet, PathKind};
pub use term::WindowSize;
