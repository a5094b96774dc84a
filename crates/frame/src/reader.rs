//! The reading half of the framed transport (spec §4.1 `read()`).

use std::io::Read;

use crate::error::FrameError;
use crate::kind::FrameKind;

/// Reads frames off a byte stream. Owned by exactly one thread per spec
/// §5 (the client's server-stream demuxer, or the server's main
/// demuxer) — there is no internal locking because nothing else reads
/// concurrently.
pub struct FrameReader<R> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Blocks until a full frame has arrived, then returns its type and
    /// payload. Short reads of the type byte, the length field, or the
    /// payload are re-driven internally (`Read::read_exact`); a length
    /// field that isn't valid hex, or a type byte outside `{T,F,E,W,S}`,
    /// is reported as [`FrameError`] and the caller must tear the
    /// connection down (spec §4.1).
    pub fn read_frame(&mut self) -> Result<(FrameKind, Vec<u8>), FrameError> {
        let mut type_byte = [0u8; 1];
        self.inner.read_exact(&mut type_byte)?;
        let kind = FrameKind::from_byte(type_byte[0]).ok_or(FrameError::UnknownType(type_byte[0]))?;

        let mut len_bytes = [0u8; 4];
        self.inner.read_exact(&mut len_bytes)?;
        let len_str = std::str::from_utf8(&len_bytes)
            .map_err(|_| FrameError::InvalidLength(String::from_utf8_lossy(&len_bytes).into_owned()))?;
        let len = u16::from_str_radix(len_str, 16)
            .map_err(|_| FrameError::InvalidLength(len_str.to_string()))? as usize;

        let mut payload = vec![0u8; len];
        self.inner.read_exact(&mut payload)?;

        tracing::trace!(kind = %kind, len, "read frame");
        Ok((kind, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::FrameWriter;
    use std::io::Cursor;

    #[test]
    fn reads_back_a_frame_written_by_the_writer() {
        let writer = FrameWriter::new(Vec::new());
        writer.write_frame(FrameKind::Terminal, b"hello").unwrap();
        let bytes = writer.into_inner();

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let (kind, payload) = reader.read_frame().unwrap();
        assert_eq!(kind, FrameKind::Terminal);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn rejects_unknown_type_byte() {
        let mut reader = FrameReader::new(Cursor::new(b"X0000".to_vec()));
        assert!(matches!(reader.read_frame(), Err(FrameError::UnknownType(b'X'))));
    }

    #[test]
    fn rejects_invalid_hex_length() {
        let mut reader = FrameReader::new(Cursor::new(b"Tzzzz".to_vec()));
        assert!(matches!(reader.read_frame(), Err(FrameError::InvalidLength(_))));
    }

    #[test]
    fn short_read_at_eof_mid_frame_is_an_io_error() {
        let mut reader = FrameReader::new(Cursor::new(b"T000a123".to_vec()));
        assert!(matches!(reader.read_frame(), Err(FrameError::Io(_))));
    }
}
