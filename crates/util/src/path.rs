//! `~` and `$VAR` path expansion, applied by every peer before touching
//! the filesystem (spec §4.2 "Path expansion").

use std::env;

/// Expands a leading `~` (to `$HOME`) and any `$VAR`/`${VAR}` references in
/// `path`. Unknown variables expand to an empty string rather than being
/// left literal, matching shell `set -u`-free behavior.
pub fn expand(path: &str) -> String {
    let with_home = expand_tilde(path);
    expand_vars(&with_home)
}

fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            let home = env::var("HOME").unwrap_or_default();
            return format!("{home}{rest}");
        }
    }
    path.to_string()
}

fn expand_vars(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let chars: Vec<char> = path.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() {
            if chars[i + 1] == '{' {
                if let Some(end) = chars[i + 2..].iter().position(|&c| c == '}') {
                    let name: String = chars[i + 2..i + 2 + end].iter().collect();
                    out.push_str(&env::var(&name).unwrap_or_default());
                    i += 2 + end + 1;
                    continue;
                }
            } else if chars[i + 1].is_ascii_alphabetic() || chars[i + 1] == '_' {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                out.push_str(&env::var(&name).unwrap_or_default());
                i = end;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Splits a path into its parent directory and basename, the way
/// `get_possible_paths` needs to (spec §4.2 "Tab completion").
///
/// An empty `path` yields `(".", "")`, matching `get_possible_paths("")`
/// returning the current directory's listing.
pub fn dirname_basename(path: &str) -> (&str, &str) {
    if path.is_empty() {
        return (".", "");
    }
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (".", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_bare_tilde() {
        env::set_var("HOME", "/home/alice");
        assert_eq!(expand("~"), "/home/alice");
        assert_eq!(expand("~/foo"), "/home/alice/foo");
    }

    #[test]
    fn does_not_expand_embedded_tilde() {
        assert_eq!(expand("/foo/~bar"), "/foo/~bar");
    }

    #[test]
    fn expands_dollar_var_and_braces() {
        env::set_var("SSH2_TEST_VAR", "xyz");
        assert_eq!(expand("$SSH2_TEST_VAR/file"), "xyz/file");
        assert_eq!(expand("${SSH2_TEST_VAR}/file"), "xyz/file");
    }

    #[test]
    fn unknown_var_expands_to_empty() {
        env::remove_var("SSH2_TEST_UNSET");
        assert_eq!(expand("$SSH2_TEST_UNSET-x"), "-x");
    }

    #[test]
    fn dirname_basename_splits_correctly() {
        assert_eq!(dirname_basename(""), (".", ""));
        assert_eq!(dirname_basename("file"), (".", "file"));
        assert_eq!(dirname_basename("dir/file"), ("dir", "file"));
        assert_eq!(dirname_basename("/file"), ("/", "file"));
        assert_eq!(dirname_basename("/a/b/c"), ("/a/b", "c"));
    }
}
