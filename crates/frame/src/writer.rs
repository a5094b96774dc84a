//! The writing half of the framed transport (spec §4.1 `write()`).

use std::io::Write;
use std::sync::Mutex;

use crate::error::FrameError;
use crate::kind::FrameKind;

const MAX_PAYLOAD: usize = 0xFFFF;

/// Writes frames onto a byte stream.
///
/// The write side is guarded by a single mutex so that producers on
/// different threads (the PTY reader and the `FileServer` worker, on the
/// server; the main thread and a tab-completion request, on the client)
/// never interleave bytes from two frames on the wire (spec §4.1
/// "Ordering guarantee", §5 "Shared resources").
pub struct FrameWriter<W> {
    inner: Mutex<W>,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Writes one complete frame and flushes. `payload.len()` must not
    /// exceed `0xFFFF`; larger data must already have been split by the
    /// caller (spec §3 invariant).
    pub fn write_frame(&self, kind: FrameKind, payload: &[u8]) -> Result<(), FrameError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge(payload.len()));
        }
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.write_all(&[kind.as_byte()])?;
        guard.write_all(format!("{:04x}", payload.len()).as_bytes())?;
        guard.write_all(payload)?;
        guard.flush()?;
        tracing::trace!(kind = %kind, len = payload.len(), "wrote frame");
        Ok(())
    }

    /// Unwraps the writer, for use in tests that inspect the raw bytes.
    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_layout_is_byte_exact() {
        let writer = FrameWriter::new(Vec::new());
        writer.write_frame(FrameKind::FileTransfer, b"cmd: cd").unwrap();
        let bytes = writer.into_inner();
        assert_eq!(&bytes[0..1], b"F");
        assert_eq!(&bytes[1..5], b"0007");
        assert_eq!(&bytes[5..], b"cmd: cd");
    }

    #[test]
    fn length_0xffff_encodes_as_ffff() {
        let writer = FrameWriter::new(Vec::new());
        let payload = vec![0u8; 0xFFFF];
        writer.write_frame(FrameKind::Terminal, &payload).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(&bytes[1..5], b"ffff");
    }

    #[test]
    fn rejects_oversized_payload() {
        let writer = FrameWriter::new(Vec::new());
        let payload = vec![0u8; 0x10000];
        assert!(matches!(
            writer.write_frame(FrameKind::Terminal, &payload),
            Err(FrameError::PayloadTooLarge(0x10000))
        ));
    }
}
