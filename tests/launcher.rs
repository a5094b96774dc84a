//! Black-box launcher behavior (spec §6, §7 Config errors), the way
//! `crates/cli`'s `dev-dependencies` exercise the teacher's own binary.

use assert_cmd::Command;

#[test]
fn missing_host_name_exits_with_config_error() {
    let mut cmd = Command::cargo_bin("ssh2").unwrap();
    cmd.env("HOME", std::env::temp_dir());
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no host name given"));
}

#[test]
fn host_name_flag_bypasses_the_config_file() {
    // Exercises flag precedence over the config loader (spec §6): with
    // `--host-name` given, a missing/empty config file must not trigger
    // the `MissingHostName` diagnostic this test's sibling checks for.
    let mut cmd = Command::cargo_bin("ssh2").unwrap();
    cmd.args(["--host-name", "example.invalid"]);
    cmd.env("HOME", std::env::temp_dir());
    let output = cmd.output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("no host name given"));
}
