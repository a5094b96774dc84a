//! Errors surfaced by the file-transfer command interface (spec §4.3).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0:?} is not a recognized command")]
    UnsupportedCommand(String),

    #[error("{verb} expects {expected} argument(s), got {found}")]
    WrongArgCount {
        verb: String,
        expected: usize,
        found: usize,
    },

    #[error("{0} is not a directory")]
    NotADirectory(String),

    #[error("{0} is a file, can't send a directory to it")]
    DirIntoFile(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Operation(#[from] ftproto::OperationError),

    #[error(transparent)]
    Protocol(#[from] ftproto::ProtocolError),
}

impl CliError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
