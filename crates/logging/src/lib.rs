//! Verbosity configuration and `tracing` subscriber setup (spec §6 "Logging
//! and diagnostics"), scaled down from the teacher's per-flag
//! `VerbosityConfig`/`InfoLevels` system to this project's quiet-vs-`--log`
//! two-level need.

use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("opening log file {path}: {source}")]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("installing tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Which role is initializing logging, used only to pick the default log
/// file path when `--log` is given without further configuration (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
    /// Pre-dispatch diagnostics in the launcher, before `--server` has
    /// been read and a role decided (spec §6 "Persisted state").
    Util,
}

impl Role {
    fn default_log_path(self) -> &'static str {
        match self {
            Role::Client => "./sshwrapper.log",
            Role::Server => "~/ssh2.log",
            Role::Util => "util.log",
        }
    }
}

/// Built from the `--log` flag and the process's role (spec's AMBIENT
/// STACK §"Logging").
#[derive(Debug, Clone)]
pub struct VerbosityConfig {
    pub log_enabled: bool,
    pub log_path: Option<PathBuf>,
}

impl VerbosityConfig {
    /// `--log` was not passed: tracing still runs (so `warn!`/`error!`
    /// reach stderr) but nothing is written to a file.
    pub fn quiet() -> Self {
        Self {
            log_enabled: false,
            log_path: None,
        }
    }

    /// `--log` was passed: resolves the role's default log path unless
    /// the caller already knows a more specific one.
    pub fn logging(role: Role) -> Self {
        let expanded = util::path::expand(role.default_log_path());
        Self {
            log_enabled: true,
            log_path: Some(PathBuf::from(expanded)),
        }
    }
}

/// Installs the global `tracing` subscriber. Always writes to stderr;
/// additionally tees to `config.log_path` via a non-blocking appender when
/// `config.log_enabled` is set. Returns the appender's guard, which the
/// caller must keep alive for the process lifetime or buffered lines are
/// dropped on exit.
pub fn init(config: VerbosityConfig) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LoggingError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_path) = config.log_path.filter(|_| config.log_enabled) else {
        tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).try_init()?;
        return Ok(None);
    };

    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LoggingError::OpenLogFile {
            path: log_path.clone(),
            source: e,
        })?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| LoggingError::OpenLogFile {
            path: log_path.clone(),
            source: e,
        })?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .try_init()?;

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_config_disables_file_logging() {
        let config = VerbosityConfig::quiet();
        assert!(!config.log_enabled);
        assert!(config.log_path.is_none());
    }

    #[test]
    fn client_role_logs_to_the_cwd_relative_path() {
        let config = VerbosityConfig::logging(Role::Client);
        assert!(config.log_enabled);
        assert_eq!(config.log_path.unwrap(), PathBuf::from("./sshwrapper.log"));
    }

    #[test]
    fn server_role_logs_under_home() {
        std::env::set_var("HOME", "/home/tester");
        let config = VerbosityConfig::logging(Role::Server);
        assert_eq!(config.log_path.unwrap(), PathBuf::from("/home/tester/ssh2.log"));
    }
}
