//! The file-transfer command interface on the client: dispatches local
//! shell-like verbs (`send`, `recv`, `lls`, `lcd`, …) against a
//! [`ftproto::FileClient`] (spec §2.4, §4.3).

mod dispatch;
mod error;

pub use dispatch::{CommandOutput, FileTransferCli};
pub use error::CliError;
