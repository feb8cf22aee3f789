use crate::{
    UMicros,
    file::{FormatType, Header, Timing},
    message::{
        Event, Message,
        meta::{MetaEvent, Tempo},
    },
};
use alloc::vec::Vec;

/// A value stamped with the time it happens and the track it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timed<T> {
    /// Microseconds from the start of the file
    pub timestamp: UMicros,
    /// Index of the source track
    pub track: usize,
    /// The value
    pub event: T,
}

impl<T> Timed<T> {
    /// Stamp a value
    pub const fn new(timestamp: UMicros, track: usize, event: T) -> Self {
        Self {
            timestamp,
            track,
            event,
        }
    }
}

#[doc = r#"
An iterator over every message of a file in playing order, returned from
[`MidiReader::timeline`](super::MidiReader::timeline)

Tracks of format 0 and 1 files play at once, so their messages are merged by
tick and share one tempo map: a tempo change on any track applies from its tick
onwards. Format 2 tracks play one after another, each starting with the default
tempo of 120 BPM when the previous one ends.

A SMPTE offset at tick 0 shifts the track (or the whole file for formats 0 and 1).
"#]
#[derive(Debug, Clone)]
pub struct Timeline {
    events: alloc::vec::IntoIter<Timed<Message>>,
}

impl Timeline {
    pub(super) fn new(header: &Header, tracks: Vec<Vec<Message>>) -> Self {
        let timing = *header.timing();
        let size = tracks.iter().map(Vec::len).sum();
        let mut events = Vec::with_capacity(size);

        match header.format() {
            FormatType::SequentiallyIndependent => {
                let mut start = 0.;
                for (index, track) in tracks.into_iter().enumerate() {
                    let track = track.into_iter().map(|m| (index, m)).collect();
                    start = stamp(&timing, track, start, &mut events);
                }
            }
            FormatType::SingleMultiChannel | FormatType::Simultaneous => {
                let mut merged: Vec<(usize, Message)> = tracks
                    .into_iter()
                    .enumerate()
                    .flat_map(|(index, track)| track.into_iter().map(move |m| (index, m)))
                    .collect();
                // stable, so equal ticks keep track order
                merged.sort_by_key(|(_, m)| m.position());
                stamp(&timing, merged, 0., &mut events);
            }
        }

        Self {
            events: events.into_iter(),
        }
    }
}

/// Push the messages with their times, returning the time of the last one.
fn stamp(
    timing: &Timing,
    messages: Vec<(usize, Message)>,
    start: f64,
    out: &mut Vec<Timed<Message>>,
) -> f64 {
    let mut micros = start + smpte_offset(timing, &messages);
    let mut tempo = Tempo::default();
    let mut last_tick = 0;

    for (track, message) in messages {
        let ticks = message.position().saturating_sub(last_tick);
        micros += timing.micros_for_ticks(ticks, tempo.micros_per_quarter_note());
        last_tick = message.position();
        if let Event::Meta(MetaEvent::Tempo(t)) = message.event() {
            tempo = *t;
        }
        out.push(Timed::new(UMicros::new(micros as u64), track, message));
    }
    micros
}

fn smpte_offset(timing: &Timing, messages: &[(usize, Message)]) -> f64 {
    let Some(offset) = messages
        .iter()
        .take_while(|(_, m)| m.position() == 0)
        .find_map(|(_, m)| match m.event() {
            Event::Meta(MetaEvent::SmpteOffset(offset)) => Some(offset),
            _ => None,
        })
    else {
        return 0.;
    };
    match timing {
        Timing::Smpte { fps, .. } => {
            //NOTE: if the file header uses smpte, that overrides any track smpte offset.
            if offset.fps != *fps {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Header's fps({}) does not align with track's fps({}). \
                    The file's fps will override the track's!",
                    fps.as_f64(),
                    offset.fps.as_f64()
                );
            }
            offset.as_micros_with_override(*fps)
        }
        Timing::TicksPerQuarterNote(_) => offset.as_micros(),
    }
}

impl Iterator for Timeline {
    type Item = Timed<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}

impl ExactSizeIterator for Timeline {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        file::SmpteFps,
        message::{Channel, meta::SmpteOffset},
    };
    use alloc::vec;
    use pretty_assertions::assert_eq;

    fn note_on(position: u32, note: u8) -> Message {
        Message::new(
            0,
            position,
            Event::NoteOn {
                channel: Channel::One,
                note,
                velocity: 100,
            },
        )
    }

    fn note_off(position: u32, note: u8) -> Message {
        Message::new(
            0,
            position,
            Event::NoteOff {
                channel: Channel::One,
                note,
            },
        )
    }

    fn tempo(position: u32, micros_per_quarter: u32) -> Message {
        Message::new(
            0,
            position,
            Event::Meta(MetaEvent::Tempo(Tempo::new(micros_per_quarter))),
        )
    }

    fn header(format: FormatType, tracks: u16, timing: Timing) -> Header {
        Header::new(format, tracks, timing)
    }

    fn stamps(timeline: Timeline) -> Vec<(u64, usize)> {
        timeline.map(|t| (t.timestamp.us(), t.track)).collect()
    }

    #[test]
    fn empty_file_has_no_events() {
        let header = header(
            FormatType::Simultaneous,
            0,
            Timing::new_ticks_per_quarter_note(480),
        );
        assert_eq!(Timeline::new(&header, vec![]).next(), None);
    }

    #[test]
    fn single_track_with_delta_times() {
        let header = header(
            FormatType::SingleMultiChannel,
            1,
            Timing::new_ticks_per_quarter_note(480),
        );
        let track = vec![
            tempo(0, 500_000),
            note_on(0, 60),
            note_off(480, 60),
            note_on(720, 62),
        ];
        let timeline = Timeline::new(&header, vec![track]);
        assert_eq!(timeline.len(), 4);
        assert_eq!(
            stamps(timeline),
            vec![(0, 0), (0, 0), (500_000, 0), (750_000, 0)]
        );
    }

    #[test]
    fn simultaneous_tracks_are_merged() {
        let header = header(
            FormatType::Simultaneous,
            2,
            Timing::new_ticks_per_quarter_note(480),
        );
        let first = vec![tempo(0, 500_000), note_on(0, 60), note_off(480, 60)];
        let second = vec![note_on(240, 36), note_off(720, 36)];
        assert_eq!(
            stamps(Timeline::new(&header, vec![first, second])),
            vec![
                (0, 0),
                (0, 0),
                (250_000, 1),
                (500_000, 0),
                (750_000, 1)
            ]
        );
    }

    #[test]
    fn tempo_changes_apply_from_their_tick() {
        let header = header(
            FormatType::Simultaneous,
            2,
            Timing::new_ticks_per_quarter_note(480),
        );
        let conductor = vec![tempo(0, 600_000), tempo(480, 300_000)];
        let notes = vec![note_on(480, 48), note_off(960, 48)];
        assert_eq!(
            stamps(Timeline::new(&header, vec![conductor, notes])),
            vec![(0, 0), (600_000, 0), (600_000, 1), (900_000, 1)]
        );
    }

    #[test]
    fn sequentially_independent_tracks_follow_each_other() {
        let header = header(
            FormatType::SequentiallyIndependent,
            2,
            Timing::new_ticks_per_quarter_note(960),
        );
        let first = vec![tempo(0, 1_000_000), note_on(0, 60), note_off(960, 60)];
        let second = vec![note_on(0, 48), note_off(480, 48)];
        assert_eq!(
            stamps(Timeline::new(&header, vec![first, second])),
            vec![
                (0, 0),
                (0, 0),
                (1_000_000, 0),
                (1_000_000, 1),
                (1_250_000, 1)
            ]
        );
    }

    #[test]
    fn smpte_timing_ignores_tempo() {
        let header = header(
            FormatType::SingleMultiChannel,
            1,
            Timing::new_smpte(SmpteFps::Thirty, 40),
        );
        let track = vec![
            tempo(0, 250_000),
            note_on(0, 60),
            note_off(1200, 60),
            note_on(1800, 62),
        ];
        assert_eq!(
            stamps(Timeline::new(&header, vec![track])),
            vec![(0, 0), (0, 0), (1_000_000, 0), (1_500_000, 0)]
        );
    }

    #[test]
    fn smpte_offset_shifts_the_file() {
        let header = header(
            FormatType::SingleMultiChannel,
            1,
            Timing::new_ticks_per_quarter_note(480),
        );
        let offset = SmpteOffset::new(SmpteFps::TwentyFive, 0, 0, 2, 0, 0).unwrap();
        let track = vec![
            Message::new(0, 0, Event::Meta(MetaEvent::SmpteOffset(offset))),
            note_on(480, 60),
        ];
        assert_eq!(
            stamps(Timeline::new(&header, vec![track])),
            vec![(2_000_000, 0), (2_500_000, 0)]
        );
    }
}
