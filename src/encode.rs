// Event encoders turn each voice of a normalized score into a flat sequence
// of string tokens. Every encoder here is timed: it only accepts scores
// whose first time signature is 4/4.

use num_rational::Rational32;

use super::analysis::Tonality;
use super::error::ScoreError;
use super::key::Note;
use super::score::{format_quarter_length, Event, Score, TimeSignature};
use super::voices::{find_part, Voice};

pub const REST_TOKEN: &str = "REST";

/// One file's worth of tokens, named by its output key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    pub key: String,
    pub tokens: Vec<String>,
}

pub trait Encoder: Sync {
    fn name(&self) -> &'static str;

    /// Scores the encoder refuses outright, checked before any other work.
    fn accepts(&self, score: &Score) -> Result<(), ScoreError> {
        require_common_time(score)
    }

    fn encode(&self, score: &Score, key: &Tonality) -> Result<Vec<OutputUnit>, ScoreError>;
}

pub fn require_common_time(score: &Score) -> Result<(), ScoreError> {
    match score.first_time_signature() {
        Some(time_signature) if time_signature == TimeSignature::COMMON_TIME => Ok(()),
        Some(time_signature) => Err(ScoreError::UnsupportedTimeSignature {
            found: time_signature.ratio_string(),
        }),
        None => Err(ScoreError::UnsupportedTimeSignature {
            found: "none".to_string(),
        }),
    }
}

/// MIDI number for notes, `REST` for rests.
pub fn pitch_token(pitch: Option<Note>) -> String {
    match pitch {
        Some(note) => note.midi().to_string(),
        None => REST_TOKEN.to_string(),
    }
}

/// Pitch name without octave for notes, `REST` for rests.
pub fn pitch_class_token(pitch: Option<Note>) -> String {
    match pitch {
        Some(note) => note.key().get_default_named_key().to_string(),
        None => REST_TOKEN.to_string(),
    }
}

/// Every event becomes `frames_per_quarter * duration` frames. The first
/// frame carries the note-start marker, the rest repeat the bare pitch.
#[derive(Debug, Clone)]
pub struct MonoConstantTimestep {
    pub frames_per_quarter: u32,
    pub note_start_marker: String,
}

impl MonoConstantTimestep {
    fn frame_count(&self, event: &Event) -> Option<usize> {
        let fpq = i32::try_from(self.frames_per_quarter).ok()?;
        let frames = Rational32::from_integer(fpq) * event.duration;
        if frames.is_integer() && frames.to_integer() >= 1 {
            usize::try_from(frames.to_integer()).ok()
        } else {
            None
        }
    }
}

impl Encoder for MonoConstantTimestep {
    fn name(&self) -> &'static str {
        "mono-all-constant-t"
    }

    fn encode(&self, score: &Score, key: &Tonality) -> Result<Vec<OutputUnit>, ScoreError> {
        self.accepts(score)?;
        let mut units = Vec::with_capacity(score.parts.len());
        for part in score.parts.iter() {
            let mut tokens = Vec::new();
            for event in part.events.iter() {
                let frames = self
                    .frame_count(event)
                    .ok_or_else(|| ScoreError::QuantizationFailure {
                        score: score.id.clone(),
                        voice: part.id.clone(),
                        duration: format_quarter_length(event.duration),
                    })?;
                let pitch = pitch_token(event.pitch);
                tokens.push(format!("{}{}", self.note_start_marker, pitch));
                tokens.extend(std::iter::repeat(pitch).take(frames - 1));
            }
            units.push(OutputUnit {
                key: format!("{}-{}-{}-mono-all", score.id, key.mode, part.id),
                tokens,
            });
        }
        Ok(units)
    }
}

/// One `pitch,duration` token per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoPairs {
    pub soprano_only: bool,
    pub pitch_classes: bool,
}

impl MonoPairs {
    fn tokens(&self, events: &[Event]) -> Vec<String> {
        events
            .iter()
            .map(|event| {
                let pitch = if self.pitch_classes {
                    pitch_class_token(event.pitch)
                } else {
                    pitch_token(event.pitch)
                };
                format!("{},{}", pitch, format_quarter_length(event.duration))
            })
            .collect()
    }
}

impl Encoder for MonoPairs {
    fn name(&self) -> &'static str {
        "mono-all"
    }

    fn encode(&self, score: &Score, key: &Tonality) -> Result<Vec<OutputUnit>, ScoreError> {
        self.accepts(score)?;
        if self.soprano_only {
            return Ok(find_part(score, Voice::Soprano)
                .map(|part| OutputUnit {
                    key: format!("{}-{}-soprano-mono", score.id, key.mode),
                    tokens: self.tokens(&part.events),
                })
                .into_iter()
                .collect());
        }
        Ok(score
            .parts
            .iter()
            .map(|part| OutputUnit {
                key: format!("{}-{}-{}-mono", score.id, key.mode, part.id),
                tokens: self.tokens(&part.events),
            })
            .collect())
    }
}

/// Durations only, one token per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Durations;

impl Encoder for Durations {
    fn name(&self) -> &'static str {
        "durations"
    }

    fn encode(&self, score: &Score, key: &Tonality) -> Result<Vec<OutputUnit>, ScoreError> {
        self.accepts(score)?;
        Ok(score
            .parts
            .iter()
            .map(|part| OutputUnit {
                key: format!("{}-{}-{}-duration", score.id, key.mode, part.id),
                tokens: part
                    .events
                    .iter()
                    .map(|event| format_quarter_length(event.duration))
                    .collect(),
            })
            .collect())
    }
}
