//! Server-side error tier (spec §7 "System call failures").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Nix {
        context: String,
        #[source]
        source: nix::Error,
    },

    #[error(transparent)]
    Frame(#[from] frame::FrameError),

    #[error(transparent)]
    Protocol(#[from] ftproto::ProtocolError),
}

impl ServerError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn nix(context: impl Into<String>, source: nix::Error) -> Self {
        Self::Nix {
            context: context.into(),
            source,
        }
    }
}
