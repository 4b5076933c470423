// Polyphonic inspection: all voices merged into vertical slices, cut at
// every onset or release in any voice. Used for looking at scores, never
// written to the corpus.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use super::key::NamedNote;
use super::score::{format_quarter_length, Event, QuarterLength, Score, Tie};

#[derive(Debug, Clone, PartialEq)]
pub struct SliceNote {
    pub name: NamedNote,
    /// The slice begins this note, and the note does not continue a tie.
    pub tied_from_start: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChordSlice {
    pub offset: QuarterLength,
    pub duration: QuarterLength,
    pub fermata: bool,
    /// Sounding notes from low to high; empty when every voice rests.
    pub notes: Vec<SliceNote>,
}

impl Display for ChordSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let notes: Vec<String> = self
            .notes
            .iter()
            .map(|note| format!("({}, {})", note.name, note.tied_from_start))
            .collect();
        write!(
            f,
            "({}, {}, [{}])",
            self.fermata,
            format_quarter_length(self.duration),
            notes.join(", ")
        )
    }
}

struct Placed<'a> {
    onset: QuarterLength,
    release: QuarterLength,
    event: &'a Event,
}

fn place(events: &[Event]) -> Vec<Placed<'_>> {
    let mut onset = QuarterLength::from_integer(0);
    events
        .iter()
        .map(|event| {
            let release = onset + event.duration;
            let placed = Placed {
                onset,
                release,
                event,
            };
            onset = release;
            placed
        })
        .collect()
}

pub fn chordify(score: &Score) -> Vec<ChordSlice> {
    let voices: Vec<Vec<Placed>> = score.parts.iter().map(|part| place(&part.events)).collect();

    let boundaries: BTreeSet<QuarterLength> = voices
        .iter()
        .flatten()
        .flat_map(|placed| [placed.onset, placed.release])
        .collect();
    let boundaries: Vec<QuarterLength> = boundaries.into_iter().collect();

    boundaries
        .windows(2)
        .map(|window| {
            let (start, end) = (window[0], window[1]);
            let sounding: Vec<&Placed> = voices
                .iter()
                .flatten()
                .filter(|placed| placed.onset <= start && start < placed.release)
                .collect();

            let fermata = sounding
                .iter()
                .any(|placed| placed.onset == start && placed.event.fermata);

            let mut notes: Vec<(u8, SliceNote)> = sounding
                .iter()
                .filter_map(|placed| {
                    let pitch = placed.event.pitch?;
                    let note = SliceNote {
                        name: pitch.get_default_named_note(),
                        tied_from_start: placed.onset == start && Tie::starts(placed.event.tie),
                    };
                    Some((pitch.midi(), note))
                })
                .collect();
            notes.sort_by_key(|(midi, _)| *midi);

            ChordSlice {
                offset: start,
                duration: end - start,
                fermata,
                notes: notes.into_iter().map(|(_, note)| note).collect(),
            }
        })
        .collect()
}
