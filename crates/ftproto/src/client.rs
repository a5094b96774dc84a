//! [`FileClient`]: the client-side peer of the file-transfer protocol
//! (spec §2.3, §4.2, §4.3 "Because the FileClient's read side...").

use std::collections::VecDeque;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use frame::{FrameKind, FrameWriter};
use util::hex;
use util::probe::{self, FileAttrSet, PathKind};

use crate::error::{OperationError, ProtocolError};
use crate::line::{expect_key, format_line, parse_line};
use crate::listing::{list_dir as local_list_dir, DirListing};

pub const CHUNK_SIZE: usize = 4096;

/// The enqueue end of the channel that feeds a [`FileClient`]'s reply
/// lines. Owned by the demuxer thread, which calls [`FileInbox::add_input`]
/// for every `F` frame it reads off the transport.
#[derive(Clone)]
pub struct FileInbox {
    tx: Sender<Vec<u8>>,
}

impl FileInbox {
    pub fn add_input(&self, payload: Vec<u8>) {
        // The receiver only ever disappears when the FileClient itself
        // has been dropped, at which point there is nothing left to
        // deliver to; a failed send is not an error worth reporting.
        let _ = self.tx.send(payload);
    }
}

/// Drives send/recv/list/tab-completion requests against a remote
/// `FileServer` over the shared `F` lane.
pub struct FileClient<W> {
    writer: Arc<FrameWriter<W>>,
    inbox: Receiver<Vec<u8>>,
}

impl<W: Write> FileClient<W> {
    /// Builds a client bound to `writer`'s `F` lane, returning it along
    /// with the [`FileInbox`] the demuxer thread should feed.
    pub fn new(writer: Arc<FrameWriter<W>>) -> (Self, FileInbox) {
        let (tx, rx) = mpsc::channel();
        (Self { writer, inbox: rx }, FileInbox { tx })
    }

    fn send_line(&self, key: &str, value: &str) -> Result<(), ProtocolError> {
        let line = format_line(key, value);
        self.writer.write_frame(FrameKind::FileTransfer, line.as_bytes())?;
        Ok(())
    }

    fn recv_line(&self) -> Result<String, ProtocolError> {
        let payload = self.inbox.recv().map_err(|_| ProtocolError::ChannelClosed)?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    fn recv_expect(&self, key: &str) -> Result<String, ProtocolError> {
        let line = self.recv_line()?;
        expect_key(&line, key)
    }

    /// `cmd: cd` — tells the server to align its cwd to `path`.
    pub fn cd(&self, path: &str) -> Result<(), ProtocolError> {
        self.send_line("cmd", "cd")?;
        self.send_line("path", path)
    }

    /// `cmd: get_possible_paths`.
    pub fn get_possible_paths(&self, path: &str) -> Result<Vec<String>, ProtocolError> {
        self.send_line("cmd", "get_possible_paths")?;
        self.send_line("path", path)?;
        let value = self.recv_expect("possible_paths")?;
        Ok(DirListing::split(&value))
    }

    /// `cmd: path_type`.
    pub fn path_type(&self, path: &str) -> Result<PathKind, ProtocolError> {
        self.send_line("cmd", "path_type")?;
        self.send_line("path", path)?;
        let value = self.recv_expect("type")?;
        PathKind::parse(&value).ok_or_else(|| ProtocolError::UnexpectedKey {
            expected: "file|dir|link|not_exist".to_string(),
            found: value,
        })
    }

    /// `cmd: exit`.
    pub fn exit(&self) -> Result<(), ProtocolError> {
        self.send_line("cmd", "exit")
    }

    /// `cmd: mkdir`.
    pub fn mkdir(&self, path: &str) -> Result<(), ProtocolError> {
        self.send_line("cmd", "mkdir")?;
        self.send_line("path", path)
    }

    /// `cmd: rmdir`.
    pub fn rmdir(&self, path: &str) -> Result<(), ProtocolError> {
        self.send_line("cmd", "rmdir")?;
        self.send_line("path", path)
    }

    /// `cmd: list_dir`.
    pub fn list_dir(&self, path: &str) -> Result<DirListing, ProtocolError> {
        self.send_line("cmd", "list_dir")?;
        self.send_line("path", path)?;
        let dirs = DirListing::split(&self.recv_expect("dirs")?);
        let files = DirListing::split(&self.recv_expect("files")?);
        let links = DirListing::split(&self.recv_expect("links")?);
        Ok(DirListing { dirs, files, links })
    }

    /// `cmd: send_file` — uploads `local` to `remote`, chunked at
    /// [`CHUNK_SIZE`] raw bytes per `data:` line.
    pub fn send_file(&self, local: &Path, remote: &str) -> Result<(), OperationError> {
        let meta = fs::metadata(local).map_err(|e| OperationError::io(format!("stat {}", local.display()), e))?;
        let attrs = FileAttrSet::from_metadata(&meta);

        self.send_line("cmd", "send_file")?;
        self.send_line("local", &local.to_string_lossy())?;
        self.send_line("remote", remote)?;
        self.send_line("file_type", &attrs.to_string())?;

        let mut file = fs::File::open(local).map_err(|e| OperationError::io(format!("open {}", local.display()), e))?;
        let mut buf = [0u8; CHUNK_SIZE];
        let mut total = 0usize;
        loop {
            let n = file.read(&mut buf).map_err(|e| OperationError::io(format!("read {}", local.display()), e))?;
            if n == 0 {
                break;
            }
            total += n;
            self.send_line("data", &hex::encode(&buf[..n]))?;
        }
        self.send_line("data_end", &total.to_string())?;
        Ok(())
    }

    /// `cmd: recv_file` — downloads `remote` to `local`.
    pub fn recv_file(&self, remote: &str, local: &Path) -> Result<(), OperationError> {
        self.send_line("cmd", "recv_file")?;
        self.send_line("remote", remote)?;
        self.send_line("local", &local.to_string_lossy())?;

        let file_type = self.recv_expect("file_type")?;
        let attrs = FileAttrSet::parse(&file_type);

        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).map_err(|e| OperationError::io(format!("mkdir -p {}", parent.display()), e))?;
        }
        let mut out = fs::File::create(local).map_err(|e| OperationError::io(format!("create {}", local.display()), e))?;

        let mut total = 0usize;
        loop {
            let line = self.recv_line()?;
            let (key, value) = parse_line(&line)?;
            match key.as_str() {
                "data" => {
                    let bytes = hex::decode(&value).map_err(|e| {
                        OperationError::io(format!("decode chunk for {}", local.display()), std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                    })?;
                    out.write_all(&bytes).map_err(|e| OperationError::io(format!("write {}", local.display()), e))?;
                    total += bytes.len();
                }
                "data_end" => {
                    let declared: usize = value.parse().unwrap_or(0);
                    if declared != total {
                        eprintln!("recv_file {remote} to {}, sent_size {declared}, recv_size {total}", local.display());
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
            .apply_executable_bit(local)
            .map_err(|e| OperationError::io(format!("chmod {}", local.display()), e))?;
        Ok(())
    }

    /// `cmd: send_link` — the link's own target is sent verbatim and
    /// created remotely via the symlink syscall, never via a shelled-out
    /// `ln -s` (spec §9 redesign note).
    pub fn send_link(&self, local: &Path, remote: &str) -> Result<(), OperationError> {
        let target =
            fs::read_link(local).map_err(|e| OperationError::io(format!("readlink {}", local.display()), e))?;
        self.send_line("cmd", "send_link")?;
        self.send_line("local", &local.to_string_lossy())?;
        self.send_line("remote", remote)?;
        self.send_line("link", &target.to_string_lossy())?;
        Ok(())
    }

    /// `cmd: recv_link`.
    pub fn recv_link(&self, remote: &str, local: &Path) -> Result<(), OperationError> {
        self.send_line("cmd", "recv_link")?;
        self.send_line("remote", remote)?;
        self.send_line("local", &local.to_string_lossy())?;
        let target = self.recv_expect("link")?;

        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).map_err(|e| OperationError::io(format!("mkdir -p {}", parent.display()), e))?;
        }
        let _ = fs::remove_file(local);
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, local)
            .map_err(|e| OperationError::io(format!("symlink {} -> {target}", local.display()), e))?;
        Ok(())
    }

    /// Directory send driver (spec §4.2 "Directory send (client
    /// driver)"): the remote root is wiped and recreated, then the local
    /// tree is walked.
    pub fn send_tree(&self, local_dir: &Path, remote_root: &str) -> Result<(), OperationError> {
        self.rmdir(remote_root)?;
        self.mkdir(remote_root)?;
        self.walk_send(local_dir, remote_root)
    }

    fn walk_send(&self, local_dir: &Path, remote_dir: &str) -> Result<(), OperationError> {
        let entries =
            fs::read_dir(local_dir).map_err(|e| OperationError::io(format!("readdir {}", local_dir.display()), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| OperationError::io(format!("readdir {}", local_dir.display()), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let local_path = entry.path();
            let remote_path = format!("{remote_dir}/{name}");
            match probe::classify(&local_path) {
                PathKind::Link => self.send_link(&local_path, &remote_path)?,
                PathKind::Dir => {
                    self.mkdir(&remote_path)?;
                    self.walk_send(&local_path, &remote_path)?;
                }
                PathKind::File => self.send_file(&local_path, &remote_path)?,
                PathKind::NotExist => {}
            }
        }
        Ok(())
    }

    /// Directory recv driver (spec §4.2 "Directory recv (client
    /// driver)"): a breadth-first walk of the remote tree via repeated
    /// `list_dir`.
    pub fn recv_tree(&self, remote_root: &str, local_dir: &Path) -> Result<(), OperationError> {
        fs::create_dir_all(local_dir).map_err(|e| OperationError::io(format!("mkdir -p {}", local_dir.display()), e))?;
        let mut queue = VecDeque::new();
        queue.push_back((remote_root.to_string(), local_dir.to_path_buf()));
        while let Some((remote_dir, local_dir)) = queue.pop_front() {
            let listing = self.list_dir(&remote_dir)?;
            for d in listing.dirs {
                let remote_sub = format!("{remote_dir}/{d}");
                let local_sub = local_dir.join(&d);
                fs::create_dir_all(&local_sub).map_err(|e| OperationError::io(format!("mkdir -p {}", local_sub.display()), e))?;
                queue.push_back((remote_sub, local_sub));
            }
            for f in listing.files {
                self.recv_file(&format!("{remote_dir}/{f}"), &local_dir.join(&f))?;
            }
            for l in listing.links {
                self.recv_link(&format!("{remote_dir}/{l}"), &local_dir.join(&l))?;
            }
        }
        Ok(())
    }
}

/// Helper used by callers that need a pristine listing of a *local*
/// directory (e.g. `lls`) without going through the protocol at all.
pub fn list_local_dir(dir: &Path) -> std::io::Result<DirListing> {
    local_list_dir(dir)
}
