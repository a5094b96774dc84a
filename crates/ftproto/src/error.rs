//! Two error tiers, matching spec §4.2 "Failure policy" and §7: malformed
//! lines are protocol-fatal, but missing files or size mismatches are
//! logged and the connection survives.

use thiserror::Error;

/// A malformed line (missing `": "` separator, or a key outside the
/// verb's expected set) — protocol-fatal, the peer aborts.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("line {0:?} is missing the \": \" key/value separator")]
    MissingSeparator(String),

    #[error("expected key {expected:?}, found {found:?}")]
    UnexpectedKey { expected: String, found: String },

    #[error("unrecognized command {0:?}")]
    UnknownVerb(String),

    #[error("the peer's inbound channel closed before a reply arrived")]
    ChannelClosed,

    #[error(transparent)]
    Frame(#[from] frame::FrameError),
}

/// A logical, user-visible failure (missing source path, unreadable
/// target, a `data_end` size mismatch) — reported to stderr but the
/// file-transfer session continues.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl OperationError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
