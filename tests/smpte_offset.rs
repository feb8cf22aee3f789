use midifile::prelude::*;
use pretty_assertions::assert_eq;

/// Helper function to create a minimal MIDI file with SMPTE offset
/// Returns the complete MIDI file as a byte vector
fn create_midi_with_smpte_offset(
    fps: SmpteFps,
    hour: u8,
    minute: u8,
    second: u8,
    frame: u8,
    subframe: u8,
) -> Vec<u8> {
    let mut bytes = Vec::new();

    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x06]);
    bytes.extend_from_slice(&[0x00, 0x00]); // format 0
    bytes.extend_from_slice(&[0x00, 0x01]); // one track

    // negative frame rate, then 40 ticks per frame
    bytes.push(fps.division_byte() as u8);
    bytes.push(40);

    bytes.extend_from_slice(b"MTrk");
    let track_length_pos = bytes.len();
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    let track_start = bytes.len();

    bytes.extend_from_slice(&[0x00, 0xFF, 0x54, 0x05]);
    bytes.push((fps.offset_bits() << 5) | (hour & 0x1F));
    bytes.push(minute);
    bytes.push(second);
    bytes.push(frame);
    bytes.push(subframe);

    // middle C for 96 ticks
    bytes.extend_from_slice(&[0x00, 0x90, 0x3C, 0x64]);
    bytes.extend_from_slice(&[0x60, 0x80, 0x3C, 0x40]);

    bytes.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let track_length = bytes.len() - track_start;
    bytes[track_length_pos..track_length_pos + 4]
        .copy_from_slice(&(track_length as u32).to_be_bytes());

    bytes
}

fn first_offset(bytes: &[u8]) -> ReadResult<SmpteOffset> {
    let mut reader = MidiReader::from_bytes(bytes)?;
    let message = reader.next_message(0)?;
    match message.into_event() {
        Event::Meta(MetaEvent::SmpteOffset(offset)) => Ok(offset),
        other => panic!("Expected SMPTE offset meta event, got {other:?}"),
    }
}

#[test]
fn smpte_offset_24fps() {
    let midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyFour, 12, 30, 15, 18, 50);

    let reader = MidiReader::from_bytes(&midi_data[..]).unwrap();
    assert_eq!(
        *reader.header().timing(),
        Timing::new_smpte(SmpteFps::TwentyFour, 40)
    );
    assert_eq!(reader.header().ppqn(), None);

    let offset = first_offset(&midi_data).unwrap();
    assert_eq!(offset.fps, SmpteFps::TwentyFour);
    assert_eq!(offset.hour, 12);
    assert_eq!(offset.minute, 30);
    assert_eq!(offset.second, 15);
    assert_eq!(offset.frame, 18);
    assert_eq!(offset.subframe, 50);

    let expected_micros = (12 * 3600 + 30 * 60 + 15) as f64 * 1_000_000.0
        + (18.0 / 24.0) * 1_000_000.0
        + (50.0 / 100.0 / 24.0) * 1_000_000.0;
    assert!((offset.as_micros() - expected_micros).abs() < 0.01);
}

#[test]
fn smpte_offset_25fps_pal() {
    let midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyFive, 0, 0, 1, 12, 75);
    let offset = first_offset(&midi_data).unwrap();
    assert_eq!(
        offset,
        SmpteOffset::new(SmpteFps::TwentyFive, 0, 0, 1, 12, 75).unwrap()
    );
}

#[test]
fn smpte_offset_29_97_drop_frame() {
    let midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyNine, 23, 59, 59, 28, 99);
    let offset = first_offset(&midi_data).unwrap();
    assert_eq!(offset.fps, SmpteFps::TwentyNine);
    assert_eq!(offset.hour, 23);
    assert_eq!(offset.frame, 28);
    assert_eq!(offset.subframe, 99);

    // frames are counted at 29.97 per second
    let expected = (23 * 3600 + 59 * 60 + 59) as f64 * 1_000_000.0
        + 28.0 * 1_000_000.0 / (30_000.0 / 1001.0)
        + 99.0 * 10_000.0 / (30_000.0 / 1001.0);
    assert!((offset.as_micros() - expected).abs() < 0.01);
}

#[test]
fn smpte_offset_30fps() {
    let midi_data = create_midi_with_smpte_offset(SmpteFps::Thirty, 1, 0, 0, 29, 0);
    let offset = first_offset(&midi_data).unwrap();
    assert_eq!(offset.fps, SmpteFps::Thirty);
    assert_eq!(offset.frame, 29);
}

#[test]
fn timeline_starts_at_the_offset() {
    let midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyFour, 12, 30, 15, 18, 50);
    let mut reader = MidiReader::from_bytes(&midi_data[..]).unwrap();
    let stamps: Vec<(u64, bool)> = reader
        .timeline()
        .unwrap()
        .map(|timed| (timed.timestamp.us(), timed.event.event().is_note_off()))
        .collect();

    // 96 ticks at 24 fps and 40 ticks per frame are a tenth of a second
    assert_eq!(
        stamps,
        vec![
            (45_015_770_833, false),
            (45_015_770_833, false),
            (45_015_870_833, true),
            (45_015_870_833, false),
        ]
    );
}

#[test]
fn header_fps_overrides_the_offset_fps() {
    let mut midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyFour, 0, 0, 0, 12, 0);
    // header says 25 fps, the offset still says 24
    midi_data[12] = SmpteFps::TwentyFive.division_byte() as u8;

    let offset = first_offset(&midi_data).unwrap();
    assert_eq!(offset.fps, SmpteFps::TwentyFour);

    let mut reader = MidiReader::from_bytes(&midi_data[..]).unwrap();
    let first = reader.timeline().unwrap().next().unwrap();
    // 12 frames at 25 fps
    assert_eq!(first.timestamp.us(), 480_000);
}

#[test]
fn offset_round_trips_through_the_writer() {
    let offset = SmpteOffset::new(SmpteFps::Thirty, 1, 2, 3, 15, 0).unwrap();
    let mut writer = MidiWriter::new();
    writer.add_smpte_offset(0, offset).unwrap();
    writer
        .add_note(0, 60, NoteLength::Crochet, 100, true)
        .unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    assert_eq!(
        reader.next_message(0).unwrap().into_event(),
        Event::Meta(MetaEvent::SmpteOffset(offset))
    );

    // at 120 BPM a crochet is half a second after the offset
    let timeline: Vec<_> = reader.timeline().unwrap().collect();
    let start = offset.as_micros() as u64;
    assert_eq!(timeline[0].timestamp.us(), start);
    assert_eq!(timeline[2].timestamp.us(), start + 500_000);
}

#[test]
fn offset_after_the_first_tick_is_ignored_by_the_timeline() {
    let mut writer = MidiWriter::new();
    writer.add_program_change(0, 1).unwrap();
    writer.inc_time(0, 384).unwrap();
    writer
        .add_smpte_offset(0, SmpteOffset::new(SmpteFps::TwentyFive, 1, 0, 0, 0, 0).unwrap())
        .unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    let stamps: Vec<u64> = reader
        .timeline()
        .unwrap()
        .map(|timed| timed.timestamp.us())
        .collect();
    assert_eq!(stamps, vec![0, 500_000, 500_000]);
}
