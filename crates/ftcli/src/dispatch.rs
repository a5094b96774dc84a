//! The command dispatcher driving a [`ftproto::FileClient`] from local
//! shell-like verbs (spec §4.3).

use std::env;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use ftproto::FileClient;
use util::probe::{self, PathKind};

use crate::error::CliError;

const VERBS: &[&str] = &[
    "lls", "lrm", "lmkdir", "lcd", "local", "lcp", "send", "rcp", "recv", "test", "help",
];

/// A non-fatal command result meant to be printed to the user (output of
/// `test`, `help`, or a local shell-out).
pub type CommandOutput = Option<String>;

pub struct FileTransferCli<W> {
    client: FileClient<W>,
}

impl<W: Write> FileTransferCli<W> {
    pub fn new(client: FileClient<W>) -> Self {
        Self { client }
    }

    /// Whether `line`'s leading word names one of the recognized verbs
    /// (spec §4.5 "Command classifier").
    pub fn is_cmd_supported(line: &str) -> bool {
        match line.split_whitespace().next() {
            Some(verb) => VERBS.contains(&verb),
            None => false,
        }
    }

    /// Queries the remote for tab-completion candidates (spec §4.5
    /// "Command classifier" tab handling).
    pub fn get_possible_paths(&self, partial: &str) -> Result<Vec<String>, CliError> {
        Ok(self.client.get_possible_paths(partial)?)
    }

    /// Dispatches one already-classified command line.
    pub fn handle(&self, line: &str) -> Result<CommandOutput, CliError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match verb {
            "lls" | "lrm" | "lmkdir" => self.run_local_shell(&verb[1..], &args),
            "local" => match args.split_first() {
                Some((program, rest)) => self.run_local_shell(program, rest),
                None => Err(CliError::WrongArgCount {
                    verb: verb.to_string(),
                    expected: 1,
                    found: 0,
                }),
            },
            "lcd" => self.lcd(&args),
            "lcp" | "send" => self.send(&args, verb),
            "rcp" | "recv" => self.recv(&args, verb),
            "test" => self.test(),
            "help" => Ok(Some(help_text())),
            other => Err(CliError::UnsupportedCommand(other.to_string())),
        }
    }

    fn run_local_shell(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CliError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| CliError::io(format!("exec {program}"), e))?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(Some(text))
    }

    fn lcd(&self, args: &[&str]) -> Result<CommandOutput, CliError> {
        let raw = args.first().copied().unwrap_or(".");
        let expanded = util::path::expand(raw);
        let path = Path::new(&expanded);
        if probe::classify(path) != PathKind::Dir {
            return Err(CliError::NotADirectory(expanded));
        }
        env::set_current_dir(path).map_err(|e| CliError::io(format!("cd {expanded}"), e))?;
        Ok(None)
    }

    fn test(&self) -> Result<CommandOutput, CliError> {
        let kind = self.client.path_type(".")?;
        Ok(Some(format!(". is {kind}\n")))
    }

    /// `send LOCAL REMOTE` / `lcp LOCAL REMOTE` (spec §4.3 send-side
    /// target resolution).
    fn send(&self, args: &[&str], verb: &str) -> Result<CommandOutput, CliError> {
        if args.len() != 2 {
            return Err(CliError::WrongArgCount {
                verb: verb.to_string(),
                expected: 2,
                found: args.len(),
            });
        }
        let local_raw = util::path::expand(args[0]);
        let local = Path::new(&local_raw);
        let remote_arg = args[1];
        let basename = local.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        let local_kind = probe::classify(local);
        let remote_kind = self.client.path_type(remote_arg)?;
        let target = resolve_target(remote_arg, remote_kind, local_kind, &basename)?;

        match local_kind {
            PathKind::Dir => self.client.send_tree(local, &target)?,
            PathKind::File => self.client.send_file(local, &target)?,
            PathKind::Link => self.client.send_link(local, &target)?,
            PathKind::NotExist => return Err(CliError::io(local_raw.clone(), std::io::Error::from(std::io::ErrorKind::NotFound))),
        }
        Ok(None)
    }

    /// `recv REMOTE LOCAL` / `rcp REMOTE LOCAL`, the same rules with the
    /// sides reversed.
    fn recv(&self, args: &[&str], verb: &str) -> Result<CommandOutput, CliError> {
        if args.len() != 2 {
            return Err(CliError::WrongArgCount {
                verb: verb.to_string(),
                expected: 2,
                found: args.len(),
            });
        }
        let remote_arg = args[0];
        let local_raw = util::path::expand(args[1]);
        let local = Path::new(&local_raw);
        let (_, basename) = util::path::dirname_basename(remote_arg);

        let remote_kind = self.client.path_type(remote_arg)?;
        let local_kind = probe::classify(local);
        let target = resolve_target(&local_raw, local_kind, remote_kind, basename)?;
        let target_path = Path::new(&target).to_path_buf();

        match remote_kind {
            PathKind::Dir => self.client.recv_tree(remote_arg, &target_path)?,
            PathKind::File => self.client.recv_file(remote_arg, &target_path)?,
            PathKind::Link => self.client.recv_link(remote_arg, &target_path)?,
            PathKind::NotExist => return Err(CliError::io(remote_arg.to_string(), std::io::Error::from(std::io::ErrorKind::NotFound))),
        }
        Ok(None)
    }
}

/// Resolves the destination path for a send/recv transfer (spec §4.3):
/// when the source is a file and the destination already names a
/// directory, the source's basename is appended; when the source is a
/// directory and the destination already names a directory, same thing;
/// otherwise the destination is used verbatim. A directory source against
/// an existing file destination is refused outright, matching the
/// original's "is a file, can't send dir to it" check.
fn resolve_target(dest: &str, dest_kind: PathKind, source_kind: PathKind, source_basename: &str) -> Result<String, CliError> {
    let dest_is_existing_dir = dest_kind == PathKind::Dir;
    match source_kind {
        PathKind::Dir if dest_kind == PathKind::File => Err(CliError::DirIntoFile(dest.to_string())),
        PathKind::File | PathKind::Link if dest_is_existing_dir => Ok(format!("{dest}/{source_basename}")),
        PathKind::Dir if dest_is_existing_dir => Ok(format!("{dest}/{source_basename}")),
        _ => Ok(dest.to_string()),
    }
}

fn help_text() -> String {
    [
        "lls ARGS        — run `ls ARGS` locally",
        "lrm ARGS        — run `rm ARGS` locally",
        "lmkdir ARGS     — run `mkdir ARGS` locally",
        "lcd PATH        — change the local working directory",
        "local CMD ARGS  — run an arbitrary local command",
        "send LOCAL REMOTE, lcp LOCAL REMOTE — upload a file or directory",
        "recv REMOTE LOCAL, rcp REMOTE LOCAL — download a file or directory",
        "test            — query the remote path type of \".\"",
        "help            — show this text",
    ]
    .join("\n")
        + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_supported_verbs() {
        assert!(FileTransferCli::<Vec<u8>>::is_cmd_supported("lls -la"));
        assert!(FileTransferCli::<Vec<u8>>::is_cmd_supported("send a b"));
        assert!(!FileTransferCli::<Vec<u8>>::is_cmd_supported("ls -la"));
        assert!(!FileTransferCli::<Vec<u8>>::is_cmd_supported(""));
    }

    #[test]
    fn resolve_target_appends_basename_when_dest_is_existing_dir() {
        assert_eq!(resolve_target("remote/dir", PathKind::Dir, PathKind::File, "a.txt").unwrap(), "remote/dir/a.txt");
        assert_eq!(resolve_target("remote/dir", PathKind::Dir, PathKind::Dir, "sub").unwrap(), "remote/dir/sub");
    }

    #[test]
    fn resolve_target_is_verbatim_when_dest_does_not_exist() {
        assert_eq!(resolve_target("new_name.txt", PathKind::NotExist, PathKind::File, "a.txt").unwrap(), "new_name.txt");
        assert_eq!(resolve_target("new_dir", PathKind::NotExist, PathKind::Dir, "sub").unwrap(), "new_dir");
    }

    #[test]
    fn resolve_target_refuses_directory_source_into_existing_file_dest() {
        let err = resolve_target("remote/existing_file", PathKind::File, PathKind::Dir, "sub").unwrap_err();
        assert!(matches!(err, CliError::DirIntoFile(path) if path == "remote/existing_file"));
    }
}
