use midifile::prelude::*;
use pretty_assertions::assert_eq;

/// Helper to create raw SMPTE offset data bytes
fn create_smpte_bytes(
    fps_bits: u8,
    hour: u8,
    minute: u8,
    second: u8,
    frame: u8,
    subframe: u8,
) -> Vec<u8> {
    vec![
        (fps_bits << 5) | (hour & 0x1F),
        minute,
        second,
        frame,
        subframe,
    ]
}

/// A one-track file whose only event is an SMPTE offset meta with `payload`
fn file_with_offset_payload(payload: &[u8]) -> Vec<u8> {
    let mut track = vec![0x00, 0xFF, 0x54, payload.len() as u8];
    track.extend_from_slice(payload);
    track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut bytes = b"MThd\0\0\0\x06\0\0\0\x01\x01\x80".to_vec();
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&track);
    bytes
}

#[test]
fn invalid_length() {
    assert!(matches!(
        SmpteOffset::parse(&[0x00, 0x00, 0x00]),
        Err(SmpteError::Length(3))
    ));
    assert!(matches!(
        SmpteOffset::parse(&[0x00; 6]),
        Err(SmpteError::Length(6))
    ));
    assert!(matches!(SmpteOffset::parse(&[]), Err(SmpteError::Length(0))));
}

#[test]
fn invalid_frame_type() {
    // only the two bits above the hour are the rate, so bit 7 makes 4 and up
    for bits in [0b100, 0b101, 0b111] {
        let data = create_smpte_bytes(bits, 12, 30, 15, 10, 50);
        let result = SmpteOffset::parse(&data);
        assert!(
            matches!(result, Err(SmpteError::TrackFrame(b)) if b == bits),
            "{bits:#b} gave {result:?}"
        );
    }
}

#[test]
fn invalid_fields() {
    assert!(matches!(
        SmpteOffset::parse(&[0x18, 0, 0, 0, 0]),
        Err(SmpteError::HourOffset(24))
    ));
    assert!(matches!(
        SmpteOffset::parse(&[0x1F, 0, 0, 0, 0]),
        Err(SmpteError::HourOffset(31))
    ));
    assert!(matches!(
        SmpteOffset::parse(&create_smpte_bytes(0, 0, 60, 0, 0, 0)),
        Err(SmpteError::MinuteOffset(60))
    ));
    assert!(matches!(
        SmpteOffset::parse(&create_smpte_bytes(0, 0, 0, 60, 0, 0)),
        Err(SmpteError::SecondOffset(60))
    ));
    assert!(matches!(
        SmpteOffset::parse(&create_smpte_bytes(0, 0, 0, 0, 0, 100)),
        Err(SmpteError::Subframe(100))
    ));
}

#[test]
fn boundary_values() {
    let test_cases = vec![
        (0, 0, 0, 0, 0, 0),
        (0, 23, 59, 59, 23, 99),
        (1, 23, 59, 59, 24, 99),
        (2, 23, 59, 59, 29, 99),
        (3, 23, 59, 59, 29, 99),
    ];

    for (fps_bits, hour, minute, second, frame, subframe) in test_cases {
        let data = create_smpte_bytes(fps_bits, hour, minute, second, frame, subframe);
        let offset = SmpteOffset::parse(&data).unwrap();
        assert_eq!(offset.hour, hour);
        assert_eq!(offset.minute, minute);
        assert_eq!(offset.second, second);
        assert_eq!(offset.frame, frame);
        assert_eq!(offset.subframe, subframe);
        assert_eq!(offset.to_bytes().to_vec(), data);
    }
}

#[test]
fn frame_limits_follow_the_rate() {
    let test_cases = [(0, 24), (1, 25), (2, 30), (3, 30)];
    for (fps_bits, frame) in test_cases {
        let data = create_smpte_bytes(fps_bits, 12, 30, 45, frame, 50);
        assert!(
            matches!(SmpteOffset::parse(&data), Err(SmpteError::Frame(f)) if f == frame),
            "frame {frame} should not fit rate {fps_bits}"
        );
    }
}

#[test]
fn first_error_wins() {
    assert!(matches!(
        SmpteOffset::parse(&create_smpte_bytes(0, 25, 61, 30, 15, 50)),
        Err(SmpteError::HourOffset(25))
    ));
    assert!(matches!(
        SmpteOffset::parse(&create_smpte_bytes(1, 23, 60, 60, 15, 50)),
        Err(SmpteError::MinuteOffset(60))
    ));
    assert!(matches!(
        SmpteOffset::parse(&create_smpte_bytes(2, 23, 59, 59, 29, 100)),
        Err(SmpteError::Subframe(100))
    ));
}

#[test]
fn drop_frame_precision() {
    let offset = SmpteOffset::parse(&create_smpte_bytes(2, 0, 0, 0, 1, 0)).unwrap();
    // one frame is 1001/30000 of a second
    let exact_frame_duration = 1_001_000.0 / 30.0;
    assert!((offset.as_micros() - exact_frame_duration).abs() < 0.001);
}

#[test]
fn reader_reports_invalid_offsets() {
    let bytes = file_with_offset_payload(&create_smpte_bytes(0, 24, 0, 0, 0, 0));
    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    let err = reader.next_message(0).unwrap_err();
    assert!(matches!(
        err.error_kind(),
        ReaderErrorKind::Smpte(SmpteError::HourOffset(24))
    ));
    // the cursor stays in front of the bad event
    assert_eq!(reader.cursor(0).unwrap().position(), 0);
    assert!(reader.next_message(0).is_err());
}

#[test]
fn reader_reports_offsets_of_the_wrong_length() {
    let bytes = file_with_offset_payload(&[0x00, 0x00, 0x00, 0x00]);
    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    let err = reader.next_message(0).unwrap_err();
    assert!(matches!(
        err.error_kind(),
        ReaderErrorKind::Smpte(SmpteError::Length(4))
    ));
}

#[test]
fn writer_rejects_invalid_offsets() {
    let mut writer = MidiWriter::new();
    let offset = SmpteOffset {
        fps: SmpteFps::TwentyFive,
        hour: 0,
        minute: 0,
        second: 0,
        frame: 25,
        subframe: 0,
    };
    assert!(matches!(
        writer.add_smpte_offset(0, offset),
        Err(WriterError::Smpte(SmpteError::Frame(25)))
    ));
    assert_eq!(writer.end_position(0).unwrap(), 0);
    assert_eq!(writer.finish().unwrap().len(), 14);
}
