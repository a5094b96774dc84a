//! The `~/.sshwrapper.config` loader (spec §6 "Config file format").

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A loaded config file: an unordered `key -> value` map. Lines without
/// exactly one `=` are silently ignored, and whitespace around both the
/// key and the value is trimmed.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    pub fn parse(contents: &str) -> Self {
        let mut values = HashMap::new();
        for line in contents.lines() {
            let mut parts = line.splitn(2, '=');
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            if line.matches('=').count() != 1 {
                continue;
            }
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The single recognized key today (spec §6).
    pub fn host_name(&self) -> Option<&str> {
        self.get("host_name")
    }
}

/// Loads the config file at `path`. A missing file is treated as an
/// empty config rather than an error — the client falls back to
/// `--host-name` in that case.
pub fn load_config(path: &Path) -> Config {
    match fs::read_to_string(path) {
        Ok(contents) => Config::parse(&contents),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_lines() {
        let cfg = Config::parse("host_name = alice@example.com\n");
        assert_eq!(cfg.host_name(), Some("alice@example.com"));
    }

    #[test]
    fn ignores_lines_without_exactly_one_equals() {
        let cfg = Config::parse("no equals here\nkey=a=b\nhost_name=h\n");
        assert_eq!(cfg.get("no equals here"), None);
        assert_eq!(cfg.get("key"), None);
        assert_eq!(cfg.host_name(), Some("h"));
    }

    #[test]
    fn trims_whitespace() {
        let cfg = Config::parse("  host_name  =   bob@host  \n");
        assert_eq!(cfg.host_name(), Some("bob@host"));
    }

    #[test]
    fn missing_file_yields_empty_config() {
        let cfg = load_config(Path::new("/no/such/file/ssh2-test"));
        assert_eq!(cfg.host_name(), None);
    }
}
