use midifile::prelude::*;
use pretty_assertions::assert_eq;

/// Wrap raw track bodies in a format 1 file at 96 ticks per quarter note
fn file_with_tracks(tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = b"MThd\0\0\0\x06\0\x01".to_vec();
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x60]);
    for track in tracks {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }
    bytes
}

fn all_messages(bytes: &[u8], track: usize) -> Vec<Message> {
    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    reader.messages(track).map(Result::unwrap).collect()
}

#[test]
fn header_round_trip() {
    let mut writer = MidiWriter::new();
    writer.set_ppqn(480).unwrap();
    writer.add_text(0, TextType::TrackName, "Conductor").unwrap();
    writer.add_tempo(0, 120).unwrap();
    writer
        .add_note(1, 60, NoteLength::Crochet, 100, true)
        .unwrap();
    let bytes = writer.finish().unwrap();

    let reader = MidiReader::from_bytes(bytes).unwrap();
    assert_eq!(reader.header().format(), FormatType::Simultaneous);
    assert_eq!(reader.header().ppqn(), Some(480));
    assert_eq!(reader.header().num_tracks(), 2);
    assert_eq!(reader.num_tracks(), 2);
}

#[test]
fn running_status_reuses_the_previous_status() {
    let bytes = file_with_tracks(&[&[
        0x00, 0x90, 0x3C, 0x64, // note-on
        0x0A, 0x3C, 0x00, // same status, velocity 0
        0x00, 0xFF, 0x2F, 0x00,
    ]]);
    let messages = all_messages(&bytes, 0);

    assert_eq!(messages.len(), 3);
    let second = &messages[1];
    assert!(second.is_implied());
    assert_eq!(second.delta(), 10);
    assert_eq!(second.position(), 10);
    assert_eq!(second.size(), 2);
    assert_eq!(
        second.event(),
        &Event::NoteOn {
            channel: Channel::One,
            note: 60,
            velocity: 0
        }
    );
    assert!(second.event().is_note_off());
}

#[test]
fn polyphony_is_bounded() {
    let mut writer = MidiWriter::with_options(WriterOptions::default().with_polyphony(3));
    for note in [60, 64, 67] {
        writer
            .add_note(0, note, NoteLength::Semibreve, 100, false)
            .unwrap();
    }
    assert_eq!(writer.sounding_notes(0).unwrap(), 3);
    assert!(matches!(
        writer.add_note(0, 72, NoteLength::Semibreve, 100, false),
        Err(WriterError::PolyphonyExceeded {
            track: 0,
            polyphony: 3
        })
    ));
    assert_eq!(writer.sounding_notes(0).unwrap(), 3);

    // a slot frees up once time passes the first note-offs
    writer.add_rest(0, NoteLength::Semibreve).unwrap();
    assert_eq!(writer.sounding_notes(0).unwrap(), 0);
    writer
        .add_note(0, 72, NoteLength::Crochet, 100, true)
        .unwrap();
}

#[test]
fn note_offs_are_written_in_end_order() {
    let mut writer = MidiWriter::new();
    writer.add_note(0, 60, NoteLength::Ticks(300), 100, false).unwrap();
    writer.add_note(0, 62, NoteLength::Ticks(100), 100, false).unwrap();
    writer.add_note(0, 64, NoteLength::Ticks(200), 100, false).unwrap();
    let bytes = writer.finish().unwrap();

    let offs: Vec<(u32, u8)> = all_messages(&bytes, 0)
        .iter()
        .filter_map(|m| match m.event() {
            Event::NoteOff { note, .. } => Some((m.position(), *note)),
            _ => None,
        })
        .collect();
    assert_eq!(offs, vec![(100, 62), (200, 64), (300, 60)]);
}

#[test]
fn later_events_follow_earlier_note_offs() {
    let mut writer = MidiWriter::new();
    writer.add_note(0, 60, NoteLength::Ticks(50), 100, false).unwrap();
    writer.inc_time(0, 80).unwrap();
    writer.add_control_change(0, 64, 0).unwrap();
    let bytes = writer.finish().unwrap();

    let kinds: Vec<(u32, MessageType)> = all_messages(&bytes, 0)
        .iter()
        .map(|m| (m.position(), m.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (0, MessageType::NoteOn),
            (50, MessageType::NoteOff),
            (80, MessageType::ControlChange),
            (80, MessageType::Meta),
        ]
    );
}

#[test]
fn tempo_fidelity() {
    let mut writer = MidiWriter::new();
    writer.add_tempo(0, 120).unwrap();
    writer.add_tempo(0, 7).unwrap();
    let bytes = writer.finish().unwrap();

    let tempos: Vec<Tempo> = all_messages(&bytes, 0)
        .into_iter()
        .filter_map(|m| match m.into_event() {
            Event::Meta(MetaEvent::Tempo(tempo)) => Some(tempo),
            _ => None,
        })
        .collect();
    assert_eq!(tempos[0].micros_per_quarter_note(), 500_000);
    assert_eq!(tempos[0].bpm(), 120);
    // 60_000_000 / 7 does not divide evenly
    assert_eq!(tempos[1].micros_per_quarter_note(), 8_571_428);
    assert_eq!(tempos[1].bpm(), 7);
}

#[test]
fn text_is_truncated_to_the_capacity() {
    let mut writer = MidiWriter::new();
    writer
        .add_text(0, TextType::TrackName, "A rather long track name")
        .unwrap();
    writer.add_program_change(0, 3).unwrap();
    let bytes = writer.finish().unwrap();

    let options = ReadOptions::default().with_text_capacity(8);
    let mut reader = MidiReader::from_bytes_with(&bytes[..], options).unwrap();
    let name = reader.next_message(0).unwrap();
    assert_eq!(
        name.event(),
        &Event::Meta(MetaEvent::TrackName(b"A rathe".to_vec()))
    );
    // the rest of the name was skipped, not left for the next read
    assert_eq!(name.size(), 3 + 24);
    assert_eq!(reader.next_message(0).unwrap().kind(), MessageType::ProgramChange);

    let mut reader = MidiReader::from_bytes(&bytes[..]).unwrap();
    let name = reader.next_message(0).unwrap();
    let Event::Meta(meta) = name.event() else {
        panic!("expected a meta event");
    };
    assert_eq!(meta.text_str(), Some("A rather long track name"));
}

#[test]
fn end_of_track_leaves_the_cursor_alone() {
    let bytes = file_with_tracks(&[&[0x00, 0xC0, 0x05, 0x00, 0xFF, 0x2F, 0x00]]);
    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    let mut message = Message::default();
    reader.read_message(0, &mut message).unwrap();
    reader.read_message(0, &mut message).unwrap();

    let before = *reader.cursor(0).unwrap();
    assert!(before.is_at_end());
    for _ in 0..2 {
        let err = reader.read_message(0, &mut message).unwrap_err();
        assert!(err.is_end_of_track());
        assert_eq!(*reader.cursor(0).unwrap(), before);
    }

    reader.rewind(0).unwrap();
    assert_eq!(reader.next_message(0).unwrap().kind(), MessageType::ProgramChange);
}

#[test]
fn meta_and_sysex_round_trip() {
    let sysex = [0x7E, 0x7F, 0x09, 0x01, 0xF7];
    let mut writer = MidiWriter::new();
    writer.add_sequence_number(0, Some(7)).unwrap();
    writer.add_sequence_number(0, None).unwrap();
    writer.add_text(0, TextType::Copyright, "(c) nobody").unwrap();
    writer.add_midi_port(0, 2).unwrap();
    writer
        .add_time_signature(0, TimeSignature::new(6, 8).unwrap().with_metronome(36, 8))
        .unwrap();
    writer
        .add_key_signature(0, KeySignature::new(-3, true).unwrap())
        .unwrap();
    writer.add_sequencer_specific(0, &[0x00, 0x00, 0x41]).unwrap();
    writer.add_sysex(0, &sysex).unwrap();
    let bytes = writer.finish().unwrap();

    let events: Vec<Event> = all_messages(&bytes, 0)
        .into_iter()
        .map(Message::into_event)
        .collect();
    assert_eq!(
        events,
        vec![
            Event::Meta(MetaEvent::SequenceNumber(Some(7))),
            Event::Meta(MetaEvent::SequenceNumber(None)),
            Event::Meta(MetaEvent::Copyright(b"(c) nobody".to_vec())),
            Event::Meta(MetaEvent::MidiPort(2)),
            Event::Meta(MetaEvent::TimeSignature(
                TimeSignature::new(6, 8).unwrap().with_metronome(36, 8)
            )),
            Event::Meta(MetaEvent::KeySignature(KeySignature::new(-3, true).unwrap())),
            Event::Meta(MetaEvent::SequencerSpecific(vec![0x00, 0x00, 0x41])),
            Event::SysEx(sysex.to_vec()),
            Event::Meta(MetaEvent::EndOfTrack),
        ]
    );
}

#[test]
fn channel_messages_round_trip() {
    let mut writer = MidiWriter::new();
    writer.set_default_channel(0, 10).unwrap();
    writer.add_key_pressure(0, 38, 90).unwrap();
    writer.add_control_change(0, 7, 127).unwrap();
    writer.add_program_change(0, 0).unwrap();
    writer.add_channel_pressure(0, 20).unwrap();
    writer.add_pitch_wheel(0, -1000).unwrap();
    let bytes = writer.finish().unwrap();

    let channel = Channel::Ten;
    let events: Vec<Event> = all_messages(&bytes, 0)
        .into_iter()
        .map(Message::into_event)
        .take(5)
        .collect();
    assert_eq!(
        events,
        vec![
            Event::KeyPressure {
                channel,
                note: 38,
                pressure: 90
            },
            Event::ControlChange {
                channel,
                controller: 7,
                value: 127
            },
            Event::ProgramChange {
                channel,
                program: 0
            },
            Event::ChannelPressure {
                channel,
                pressure: 20
            },
            Event::PitchWheel {
                channel,
                value: -1000
            },
        ]
    );
}

#[test]
fn a_message_buffer_is_reused() {
    let mut writer = MidiWriter::new();
    writer.add_text(0, TextType::Lyric, "la").unwrap();
    writer.add_text(0, TextType::Marker, "Verse").unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    let mut message = Message::default();
    reader.read_message(0, &mut message).unwrap();
    assert_eq!(message.event(), &Event::Meta(MetaEvent::Lyric(b"la".to_vec())));
    reader.read_message(0, &mut message).unwrap();
    assert_eq!(
        message.event(),
        &Event::Meta(MetaEvent::Marker(b"Verse".to_vec()))
    );
    reader.read_message(0, &mut message).unwrap();
    assert_eq!(message.event(), &Event::Meta(MetaEvent::EndOfTrack));
}

#[test]
fn unterminated_delta_time_stays_inside_the_chunk() {
    // the second track would decode the first's bytes if reads were unbounded
    let bytes = file_with_tracks(&[&[0x80, 0x80], &[0x00, 0xFF, 0x2F, 0x00]]);
    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    let err = reader.next_message(0).unwrap_err();
    assert!(err.is_out_of_bounds(), "{err}");
    assert_eq!(
        reader.next_message(1).unwrap().into_event(),
        Event::Meta(MetaEvent::EndOfTrack)
    );
}

#[test]
fn overlong_meta_length_stays_inside_the_chunk() {
    let bytes = file_with_tracks(&[
        &[0x00, 0xFF, 0x01, 0x7F, b'h', b'i'],
        &[0x00, 0xFF, 0x2F, 0x00],
    ]);
    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    assert!(reader.next_message(0).unwrap_err().is_out_of_bounds());
    assert!(reader.messages(1).all(|m| m.is_ok()));
}

#[test]
fn bad_magic_is_an_invalid_header() {
    let mut bytes = file_with_tracks(&[&[0x00, 0xFF, 0x2F, 0x00]]);
    bytes[..4].copy_from_slice(b"RIFF");
    let err = MidiReader::from_bytes(bytes).unwrap_err();
    assert!(err.is_invalid_header());
}

#[test]
fn timeline_merges_tracks_and_follows_tempo() {
    let mut writer = MidiWriter::new();
    writer.set_ppqn(480).unwrap();
    writer.add_tempo(0, 60).unwrap();
    writer.add_rest(0, NoteLength::Crochet).unwrap();
    writer.add_tempo(0, 120).unwrap();
    writer
        .add_note(1, 60, NoteLength::Minim, 100, true)
        .unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    let stamps: Vec<(u64, usize, MessageType)> = reader
        .timeline()
        .unwrap()
        .map(|t| (t.timestamp.us(), t.track, t.event.kind()))
        .collect();
    // one second for the first beat at 60 BPM, half a second for the next at 120
    assert_eq!(
        stamps,
        vec![
            (0, 0, MessageType::Meta),
            (0, 1, MessageType::NoteOn),
            (1_000_000, 0, MessageType::Meta),
            (1_000_000, 0, MessageType::Meta),
            (1_500_000, 1, MessageType::NoteOff),
            (1_500_000, 1, MessageType::Meta),
        ]
    );
}

#[cfg(feature = "std")]
#[test]
fn save_and_open() {
    let path = std::env::temp_dir().join(format!("midifile-{}.mid", std::process::id()));

    let mut writer = MidiWriter::new();
    writer.add_text(0, TextType::TrackName, "Piano").unwrap();
    for note in [60, 62, 64, 65] {
        writer
            .add_note(0, note, NoteLength::Quaver, 80, true)
            .unwrap();
    }
    writer.save(&path).unwrap();

    let mut reader = MidiReader::open(&path).unwrap();
    let notes: Vec<u8> = reader
        .messages(0)
        .filter_map(|m| match m.unwrap().into_event() {
            Event::NoteOn { note, .. } => Some(note),
            _ => None,
        })
        .collect();
    assert_eq!(notes, vec![60, 62, 64, 65]);
    assert_eq!(reader.cursor(0).unwrap().position(), 192 * 4);

    std::fs::remove_file(&path).unwrap();
}

#[cfg(feature = "std")]
#[test]
fn missing_file_is_an_invalid_header() {
    let path = std::env::temp_dir().join(format!("midifile-missing-{}.mid", std::process::id()));
    let err = MidiReader::open(&path).unwrap_err();
    assert!(err.is_invalid_header());
    assert_eq!(err.position(), 0);
}
