//! [`FileServer`]: the server-side peer (spec §4.2 "Server dispatch
//! table").

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use frame::{FrameKind, FrameWriter};
use util::hex;
use util::probe::{self, FileAttrSet, PathKind};

use crate::client::CHUNK_SIZE;
use crate::error::{OperationError, ProtocolError};
use crate::line::{expect_key, format_line, parse_line};
use crate::listing::{list_dir, possible_paths, DirListing};

/// Receives one already-parsed `F`-frame line at a time and drives the
/// verb dispatch loop. The caller owns reading frames off the transport
/// and handing their payload to [`FileServer::handle_line`]; this keeps
/// the server agnostic of whatever demultiplexing scheme feeds it.
///
/// The writer is shared (`Arc`) rather than owned outright because on
/// the real server this same write-side mutex also carries `T` frames
/// from the PTY reader thread (spec §4.4 "the write-side mutex ensures
/// these do not interleave with `T` frames mid-frame").
pub struct FileServer<W> {
    writer: Arc<FrameWriter<W>>,
    cwd: PathBuf,
}

impl<W: Write> FileServer<W> {
    pub fn new(writer: Arc<FrameWriter<W>>, start_dir: PathBuf) -> Self {
        Self { writer, cwd: start_dir }
    }

    fn reply(&self, key: &str, value: &str) -> Result<(), ProtocolError> {
        let line = format_line(key, value);
        self.writer.write_frame(FrameKind::FileTransfer, line.as_bytes())?;
        Ok(())
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let expanded = util::path::expand(path);
        let p = Path::new(&expanded);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.cwd.join(p)
        }
    }

    /// Reads one verb's worth of lines from `read_line` and dispatches
    /// it. Returns `Ok(true)` to keep the session alive, `Ok(false)` on
    /// `cmd: exit`.
    pub fn handle_line<F>(&mut self, line: &str, mut read_line: F) -> Result<bool, ProtocolError>
    where
        F: FnMut() -> Result<String, ProtocolError>,
    {
        let cmd = expect_key(line, "cmd")?;
        match cmd.as_str() {
            "cd" => {
                let path = expect_key(&read_line()?, "path")?;
                self.cwd = self.resolve(&path);
                Ok(true)
            }
            "exit" => Ok(false),
            "path_type" => {
                let path = expect_key(&read_line()?, "path")?;
                let kind = probe::classify(&self.resolve(&path));
                self.reply("type", &kind.to_string())?;
                Ok(true)
            }
            "get_possible_paths" => {
                let path = expect_key(&read_line()?, "path")?;
                let resolved = self.resolve(&path);
                let names = possible_paths(&resolved.to_string_lossy()).unwrap_or_default();
                self.reply("possible_paths", &DirListing::join(&names))?;
                Ok(true)
            }
            "mkdir" => {
                let path = expect_key(&read_line()?, "path")?;
                if let Err(e) = fs::create_dir_all(self.resolve(&path)) {
                    eprintln!("mkdir {path}: {e}");
                }
                Ok(true)
            }
            "rmdir" => {
                let raw = expect_key(&read_line()?, "path")?;
                // Safety check runs against the literal, un-expanded
                // input: refusing must happen before `~`/`$VAR` expansion
                // could turn something else into "~" or "/".
                if raw == "~" || raw == "/" {
                    eprintln!("rmdir refused for protected path {raw:?}");
                    return Ok(true);
                }
                let target = self.resolve(&raw);
                if let Err(e) = fs::remove_dir_all(&target) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        eprintln!("rmdir {raw}: {e}");
                    }
                }
                Ok(true)
            }
            "list_dir" => {
                let path = expect_key(&read_line()?, "path")?;
                let resolved = self.resolve(&path);
                let listing = list_dir(&resolved).unwrap_or_default();
                self.reply("dirs", &DirListing::join(&listing.dirs))?;
                self.reply("files", &DirListing::join(&listing.files))?;
                self.reply("links", &DirListing::join(&listing.links))?;
                Ok(true)
            }
            "send_file" => {
                let local = expect_key(&read_line()?, "local")?;
                let remote = expect_key(&read_line()?, "remote")?;
                let file_type = expect_key(&read_line()?, "file_type")?;
                let attrs = FileAttrSet::parse(&file_type);
                let dest = self.resolve(&remote);
                if let Err(e) = self.receive_file_body(&dest, &attrs, &local, &remote, &mut read_line) {
                    eprintln!("send_file {local} to {remote}: {e}");
                }
                Ok(true)
            }
            "recv_file" => {
                let remote = expect_key(&read_line()?, "remote")?;
                let local = expect_key(&read_line()?, "local")?;
                let src = self.resolve(&remote);
                if let Err(e) = self.send_file_body(&src) {
                    eprintln!("recv_file {remote} to {local}: {e}");
                }
                Ok(true)
            }
            "send_link" => {
                let local = expect_key(&read_line()?, "local")?;
                let remote = expect_key(&read_line()?, "remote")?;
                let target = expect_key(&read_line()?, "link")?;
                let dest = self.resolve(&remote);
                if let Some(parent) = dest.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::remove_file(&dest);
                #[cfg(unix)]
                if let Err(e) = std::os::unix::fs::symlink(&target, &dest) {
                    eprintln!("send_link {local} to {remote}: {e}");
                }
                Ok(true)
            }
            "recv_link" => {
                let remote = expect_key(&read_line()?, "remote")?;
                let _local = expect_key(&read_line()?, "local")?;
                let src = self.resolve(&remote);
                match fs::read_link(&src) {
                    Ok(target) => self.reply("link", &target.to_string_lossy())?,
                    Err(e) => eprintln!("recv_link {remote}: {e}"),
                }
                Ok(true)
            }
            other => Err(ProtocolError::UnknownVerb(other.to_string())),
        }
    }

    fn receive_file_body<F>(
        &self,
        dest: &Path,
        attrs: &FileAttrSet,
        local: &str,
        remote: &str,
        read_line: &mut F,
    ) -> Result<(), OperationError>
    where
        F: FnMut() -> Result<String, ProtocolError>,
    {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| OperationError::io(format!("mkdir -p {}", parent.display()), e))?;
        }
        let mut out = fs::File::create(dest).map_err(|e| OperationError::io(format!("create {}", dest.display()), e))?;
        let mut total = 0usize;
        loop {
            let line = read_line()?;
            let (key, value) = parse_line(&line)?;
            match key.as_str() {
                "data" => {
                    let bytes = hex::decode(&value).map_err(|e| {
                        OperationError::io(format!("decode chunk for {}", dest.display()), std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                    })?;
                    out.write_all(&bytes).map_err(|e| OperationError::io(format!("write {}", dest.display()), e))?;
                    total += bytes.len();
                }
                "data_end" => {
                    let declared: usize = value.parse().unwrap_or(0);
                    if declared != total {
                        eprintln!("send_file {local} to {remote}, sent_size {declared}, recv_size {total}");
                    }
                    break;
                }
                _ => {
                    return Err(ProtocolError::UnexpectedKey {
                        expected: "data or data_end".to_string(),
                        found: key,
                    }
                    .into())
                }
            }
        }
        attrs
            .apply_executable_bit(dest)
            .map_err(|e| OperationError::io(format!("chmod {}", dest.display()), e))?;
        Ok(())
    }

    fn send_file_body(&self, src: &Path) -> Result<(), OperationError> {
        let meta = fs::metadata(src).map_err(|e| OperationError::io(format!("stat {}", src.display()), e))?;
        let attrs = FileAttrSet::from_metadata(&meta);
        self.reply("file_type", &attrs.to_string())?;

        let mut file = fs::File::open(src).map_err(|e| OperationError::io(format!("open {}", src.display()), e))?;
        let mut buf = [0u8; CHUNK_SIZE];
        let mut total = 0usize;
        loop {
            let n = file.read(&mut buf).map_err(|e| OperationError::io(format!("read {}", src.display()), e))?;
            if n == 0 {
                break;
            }
            total += n;
            self.reply("data", &hex::encode(&buf[..n]))?;
        }
        self.reply("data_end", &total.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn server_over(dir: PathBuf) -> FileServer<Cursor<Vec<u8>>> {
        let writer = Arc::new(FrameWriter::new(Cursor::new(Vec::new())));
        FileServer::new(writer, dir)
    }

    #[test]
    fn mkdir_then_list_dir_sees_it() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = server_over(tmp.path().to_path_buf());

        let line = format_line("cmd", "mkdir");
        let mut next = vec![format_line("path", "sub")];
        server.handle_line(&line, || Ok(next.remove(0))).unwrap();

        assert!(tmp.path().join("sub").is_dir());
    }

    #[test]
    fn rmdir_refuses_literal_tilde_and_root() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = server_over(tmp.path().to_path_buf());

        for literal in ["~", "/"] {
            let line = format_line("cmd", "rmdir");
            let mut next = vec![format_line("path", literal)];
            let alive = server.handle_line(&line, || Ok(next.remove(0))).unwrap();
            assert!(alive);
        }
        assert!(Path::new("/").is_dir());
    }

    #[test]
    fn cmd_exit_signals_shutdown() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = server_over(tmp.path().to_path_buf());
        let alive = server.handle_line(&format_line("cmd", "exit"), || unreachable!()).unwrap();
        assert!(!alive);
    }

    #[test]
    fn send_file_writes_bytes_and_reports_size_mismatch_on_short_data() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = server_over(tmp.path().to_path_buf());

        let lines = vec![
            format_line("local", "a.txt"),
            format_line("remote", "a.txt"),
            format_line("file_type", ""),
            format_line("data", &hex::encode(b"hi")),
            format_line("data_end", "999"),
        ];
        let lines = Mutex::new(lines.into_iter());
        server
            .handle_line(&format_line("cmd", "send_file"), || Ok(lines.lock().unwrap().next().unwrap()))
            .unwrap();

        assert_eq!(fs::read(tmp.path().join("a.txt")).unwrap(), b"hi");
    }
}
