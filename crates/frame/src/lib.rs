//! The multiplexed framed transport ("MsgHelper", spec §2.2, §4.1).
//!
//! A frame is a single-byte type in `{T,F,E,W,S}`, a four-character
//! lowercase-hex length, and that many bytes of payload, back to back
//! with no separators (spec §3, §6). The [`FrameReader`] and
//! [`FrameWriter`] halves are split so that a single-reader / many-writer
//! concurrency model (spec §5) can be built without locking reads.

mod error;
mod kind;
mod reader;
mod writer;

pub use error::FrameError;
pub use kind::FrameKind;
pub use reader::FrameReader;
pub use writer::FrameWriter;
