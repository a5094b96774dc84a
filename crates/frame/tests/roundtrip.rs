//! End-to-end framed transport round-trip properties (spec §8).

use std::io::Cursor;

use frame::{FrameKind, FrameReader, FrameWriter};
use proptest::prelude::*;

fn all_kinds() -> [FrameKind; 5] {
    [
        FrameKind::Terminal,
        FrameKind::FileTransfer,
        FrameKind::End,
        FrameKind::WindowResize,
        FrameKind::Sync,
    ]
}

fn round_trip(kind: FrameKind, payload: &[u8]) -> (FrameKind, Vec<u8>) {
    let writer = FrameWriter::new(Vec::new());
    writer.write_frame(kind, payload).unwrap();
    let bytes = writer.into_inner();
    let mut reader = FrameReader::new(Cursor::new(bytes));
    reader.read_frame().unwrap()
}

#[test]
fn every_kind_round_trips_empty_payload() {
    for kind in all_kinds() {
        assert_eq!(round_trip(kind, b""), (kind, Vec::new()));
    }
}

#[test]
fn round_trips_max_length_payload() {
    let payload = vec![0xAB; 0xFFFF];
    let (kind, got) = round_trip(FrameKind::FileTransfer, &payload);
    assert_eq!(kind, FrameKind::FileTransfer);
    assert_eq!(got, payload);
}

#[test]
fn consecutive_frames_from_one_writer_are_delivered_in_order() {
    let writer = FrameWriter::new(Vec::new());
    writer.write_frame(FrameKind::Terminal, b"one").unwrap();
    writer.write_frame(FrameKind::FileTransfer, b"two").unwrap();
    writer.write_frame(FrameKind::End, b"").unwrap();
    let bytes = writer.into_inner();

    let mut reader = FrameReader::new(Cursor::new(bytes));
    assert_eq!(reader.read_frame().unwrap(), (FrameKind::Terminal, b"one".to_vec()));
    assert_eq!(reader.read_frame().unwrap(), (FrameKind::FileTransfer, b"two".to_vec()));
    assert_eq!(reader.read_frame().unwrap(), (FrameKind::End, Vec::new()));
}

proptest! {
    #[test]
    fn read_of_write_is_identity(payload in prop::collection::vec(any::<u8>(), 0..4096)) {
        for kind in all_kinds() {
            let (got_kind, got_payload) = round_trip(kind, &payload);
            prop_assert_eq!(got_kind, kind);
            prop_assert_eq!(got_payload, payload.clone());
        }
    }
}
