// The score model handed to the extraction pipeline: a piece with named
// parts, each an ordered list of notes and rests measured in quarter notes.

use std::fmt::{self, Display};

use num_rational::Rational32;

use super::error::ScoreError;
use super::key::Note;

/// Durations are exact fractions of a quarter note (triplets are 1/3).
pub type QuarterLength = Rational32;

/// Render a quarter length the way the corpora spell durations: dyadic
/// values as a decimal with at least one fractional digit ("1.0", "0.75"),
/// anything else as a fraction ("1/3").
pub fn format_quarter_length(duration: QuarterLength) -> String {
    let denom = *duration.denom();
    if denom > 0 && (denom & (denom - 1)) == 0 {
        let value = f64::from(*duration.numer()) / f64::from(denom);
        format!("{:?}", value)
    } else {
        format!("{}/{}", duration.numer(), denom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tie {
    Start,
    Continue,
    Stop,
}

impl Tie {
    /// Whether the note is the first of a tied group (or not tied at all).
    pub fn starts(tie: Option<Tie>) -> bool {
        matches!(tie, None | Some(Tie::Start))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// `None` for a rest
    pub pitch: Option<Note>,
    pub duration: QuarterLength,
    pub fermata: bool,
    pub tie: Option<Tie>,
}

impl Event {
    pub fn note(pitch: Note, duration: QuarterLength) -> Self {
        Self {
            pitch: Some(pitch),
            duration,
            fermata: false,
            tie: None,
        }
    }

    pub fn rest(duration: QuarterLength) -> Self {
        Self {
            pitch: None,
            duration,
            fermata: false,
            tie: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: String,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    pub const COMMON_TIME: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    pub fn ratio_string(&self) -> String {
        format!("{}/{}", self.numerator, self.denominator)
    }
}

impl Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ratio_string())
    }
}

/// A key signature as a count of sharps; flats are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySignature {
    pub sharps: i8,
}

impl KeySignature {
    /// Each semitone up adds seven sharps (modulo the circle of fifths).
    /// Results are reported between five flats and six sharps.
    pub fn transpose(&mut self, semitones: i8) {
        let steps = (i16::from(self.sharps) + 7 * i16::from(semitones)).rem_euclid(12);
        let steps = if steps > 6 { steps - 12 } else { steps };
        self.sharps = steps as i8;
    }
}

/// Key information carried by the score metadata, unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredKey {
    pub tonic: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub id: String,
    pub parts: Vec<Part>,
    pub time_signatures: Vec<TimeSignature>,
    pub key_signatures: Vec<KeySignature>,
    pub declared_key: Option<DeclaredKey>,
}

impl Score {
    pub fn first_time_signature(&self) -> Option<TimeSignature> {
        self.time_signatures.first().copied()
    }

    pub fn notes(&self) -> impl Iterator<Item = (Note, QuarterLength)> + '_ {
        self.parts
            .iter()
            .flat_map(|part| part.events.iter())
            .filter_map(|event| event.pitch.map(|pitch| (pitch, event.duration)))
    }

    /// Transpose every note of every part. Fails without modifying the
    /// score if any note would leave MIDI range.
    pub fn transpose(&mut self, semitones: i8) -> Result<(), ScoreError> {
        if let Some((note, _)) = self.notes().find(|(note, _)| note.transpose(semitones).is_none()) {
            return Err(ScoreError::PitchOutOfRange {
                midi: note.midi(),
                semitones,
            });
        }
        for event in self.parts.iter_mut().flat_map(|part| part.events.iter_mut()) {
            event.pitch = event.pitch.and_then(|pitch| pitch.transpose(semitones));
        }
        Ok(())
    }

    pub fn transpose_key_signatures(&mut self, semitones: i8) {
        for key_signature in self.key_signatures.iter_mut() {
            key_signature.transpose(semitones);
        }
    }
}
