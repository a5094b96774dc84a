//! The launcher (spec §2.7, §4.6): parses flags, loads config, spawns
//! `ssh -T <host>` and bootstraps the remote server, or — under
//! `--server` — runs the PTY manager directly.

use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use clap::Parser;
use frame::{FrameReader, FrameWriter};
use thiserror::Error;

const BANNER: &str = "ssh server started";

#[derive(Debug, Error)]
enum ConfigError {
    #[error("no host name given: pass --host-name or set host_name in ~/.sshwrapper.config")]
    MissingHostName,
}

#[derive(Debug, Parser)]
#[command(name = "ssh2", about = "Interactive SSH session wrapper with an in-band file-transfer channel")]
struct Args {
    /// `user@host` to connect to. Falls back to `~/.sshwrapper.config`'s `host_name`.
    #[arg(long = "host-name")]
    host_name: Option<String>,

    /// Run as the remote PTY server instead of the client.
    #[arg(long)]
    server: bool,

    /// No-op alias kept for bootstrap-one-liner compatibility (see DESIGN.md).
    #[arg(long = "update-server")]
    update_server: bool,

    /// Enable file logging (see crates/logging for the role-specific path).
    #[arg(long)]
    log: bool,
}

fn main() {
    let args = Args::parse();
    let role = if args.server { logging::Role::Server } else { logging::Role::Client };
    let verbosity = if args.log { logging::VerbosityConfig::logging(role) } else { logging::VerbosityConfig::quiet() };
    let _log_guard = logging::init(verbosity).ok().flatten();

    let exit_code = match run(&args) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "ssh2 exiting");
            eprintln!("ssh2: {e}");
            1
        }
    };
    std::process::exit(exit_code);
}

#[derive(Debug, Error)]
enum LaunchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("spawning ssh: {0}")]
    Spawn(std::io::Error),
    #[error("writing bootstrap command: {0}")]
    Bootstrap(std::io::Error),
    #[error("reading banner line: {0}")]
    Banner(std::io::Error),
    #[error(transparent)]
    Server(#[from] ptyserver::ServerError),
    #[error(transparent)]
    Mediator(#[from] mediator::MediatorError),
}

fn run(args: &Args) -> Result<(), LaunchError> {
    if args.server {
        return Ok(ptyserver::serve()?);
    }
    run_client(args)
}

fn resolve_host_name(args: &Args) -> Result<String, ConfigError> {
    if let Some(host) = &args.host_name {
        return Ok(host.clone());
    }
    let config_path = PathBuf::from(util::path::expand("~/.sshwrapper.config"));
    let config = util::load_config(&config_path);
    config.host_name().map(str::to_string).ok_or(ConfigError::MissingHostName)
}

fn run_client(args: &Args) -> Result<(), LaunchError> {
    let host_name = resolve_host_name(args)?;
    tracing::info!(host = %host_name, "connecting");
    if args.update_server {
        tracing::debug!("--update-server is a no-op in this build (see DESIGN.md)");
    }

    let mut child = spawn_ssh(&host_name)?;
    let mut stdin = child.stdin.take().expect("piped stdin");
    let mut stdout = child.stdout.take().expect("piped stdout");

    send_bootstrap(&mut stdin, args)?;
    wait_for_banner(&mut stdout)?;
    tracing::info!("server banner seen, switching to framed mode");

    let reader = FrameReader::new(stdout);
    let writer = FrameWriter::new(stdin);
    let stdin_fd = io::stdin().as_raw_fd();
    mediator::run(reader, writer, stdin_fd)?;

    let _ = child.wait();
    Ok(())
}

fn spawn_ssh(host_name: &str) -> Result<Child, LaunchError> {
    Command::new("ssh")
        .arg("-T")
        .arg(host_name)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(LaunchError::Spawn)
}

/// Spec §4.6's bootstrap one-liner, redesigned per DESIGN.md: the remote
/// host already carries the same `ssh2` binary (like rsync expects a
/// matching remote rsync), so the launcher's only job is to invoke
/// `--server` there. `--update-server` is accepted but has nothing to
/// re-clone in this design and is a no-op.
fn send_bootstrap(stdin: &mut ChildStdin, args: &Args) -> Result<(), LaunchError> {
    let mut cmd = String::from("ssh2 --server");
    if args.log {
        cmd.push_str(" --log");
    }
    cmd.push('\n');
    stdin.write_all(cmd.as_bytes()).map_err(LaunchError::Bootstrap)?;
    stdin.flush().map_err(LaunchError::Bootstrap)
}

/// Reads one byte at a time until the literal banner line has been seen,
/// echoing any other remote output to stderr (ssh's MOTD, shell login
/// noise) so a failed bootstrap is still diagnosable. Reading byte by
/// byte (rather than through a `BufReader`) guarantees no framed bytes
/// written immediately after the banner are stranded in a read-ahead
/// buffer.
fn wait_for_banner(stdout: &mut ChildStdout) -> Result<(), LaunchError> {
    let mut line = String::new();
    let mut byte = [0u8; 1];
    loop {
        let n = stdout.read(&mut byte).map_err(LaunchError::Banner)?;
        if n == 0 {
            return Err(LaunchError::Banner(io::Error::new(io::ErrorKind::UnexpectedEof, "ssh session closed before banner")));
        }
        if byte[0] == b'\n' {
            if line == BANNER {
                return Ok(());
            }
            eprintln!("{line}");
            line.clear();
            continue;
        }
        line.push(byte[0] as char);
    }
}
