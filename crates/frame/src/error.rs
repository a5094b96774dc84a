//! Frame-level errors. Every variant here is protocol-fatal (spec §4.1,
//! §7): the transport reports the error and the caller tears the
//! connection down.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error on framed transport: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame type byte {0:#04x} is not one of T, F, E, W, S")]
    UnknownType(u8),

    #[error("frame length field {0:?} is not valid 4-digit lowercase hex")]
    InvalidLength(String),

    #[error("payload of {0} bytes exceeds the 0xFFFF frame length limit")]
    PayloadTooLarge(usize),
}
