//! The five-letter frame type alphabet (spec §3 "Frame").

use std::fmt;

/// The `type` byte of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Terminal bytes, either direction.
    Terminal,
    /// One line of the file-transfer `key: value` protocol.
    FileTransfer,
    /// Lifecycle end, either direction.
    End,
    /// Window size update, client to server.
    WindowResize,
    /// Sync-dir request/reply, either direction.
    Sync,
}

impl FrameKind {
    pub const fn as_byte(self) -> u8 {
        match self {
            FrameKind::Terminal => b'T',
            FrameKind::FileTransfer => b'F',
            FrameKind::End => b'E',
            FrameKind::WindowResize => b'W',
            FrameKind::Sync => b'S',
        }
    }

    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'T' => Some(FrameKind::Terminal),
            b'F' => Some(FrameKind::FileTransfer),
            b'E' => Some(FrameKind::End),
            b'W' => Some(FrameKind::WindowResize),
            b'S' => Some(FrameKind::Sync),
            _ => None,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameKind::Terminal => "T",
            FrameKind::FileTransfer => "F",
            FrameKind::End => "E",
            FrameKind::WindowResize => "W",
            FrameKind::Sync => "S",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_kind() {
        for kind in [
            FrameKind::Terminal,
            FrameKind::FileTransfer,
            FrameKind::End,
            FrameKind::WindowResize,
            FrameKind::Sync,
        ] {
            assert_eq!(FrameKind::from_byte(kind.as_byte()), Some(kind));
        }
    }

    #[test]
    fn rejects_unknown_byte() {
        assert_eq!(FrameKind::from_byte(b'X'), None);
    }
}
