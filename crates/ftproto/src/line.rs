//! The `"<key>: <value>"` line format (spec §3 "FTLine", §6 "File-transfer
//! line format").

use crate::error::ProtocolError;

/// Renders one `key: value` line. The trailing newline is never included
/// here: it is added only when the line is written outside the framed
/// transport (spec §6 notes the newline is omitted inside an `F` frame).
pub fn format_line(key: &str, value: &str) -> String {
    format!("{key}: {value}")
}

/// Parses a `"<key>: <value>"` line. Missing the `": "` separator is
/// protocol-fatal (spec §4.2 "Failure policy").
pub fn parse_line(line: &str) -> Result<(String, String), ProtocolError> {
    match line.split_once(": ") {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(ProtocolError::MissingSeparator(line.to_string())),
    }
}

/// Parses a line and asserts its key equals `expected`, returning just
/// the value. Used by both peers to walk a verb's fixed line order.
pub fn expect_key(line: &str, expected: &str) -> Result<String, ProtocolError> {
    let (key, value) = parse_line(line)?;
    if key != expected {
        return Err(ProtocolError::UnexpectedKey {
            expected: expected.to_string(),
            found: key,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_and_parses_round_trip() {
        let line = format_line("path", "/tmp/x");
        assert_eq!(line, "path: /tmp/x");
        assert_eq!(parse_line(&line).unwrap(), ("path".to_string(), "/tmp/x".to_string()));
    }

    #[test]
    fn missing_separator_is_fatal() {
        assert!(matches!(parse_line("no-colon-here"), Err(ProtocolError::MissingSeparator(_))));
    }

    #[test]
    fn expect_key_rejects_wrong_key() {
        let line = format_line("path", "x");
        assert!(matches!(
            expect_key(&line, "remote"),
            Err(ProtocolError::UnexpectedKey { .. })
        ));
    }

    #[test]
    fn value_may_itself_contain_a_colon_space() {
        let line = format_line("remote", "host: note");
        assert_eq!(parse_line(&line).unwrap().1, "host: note");
    }
}
