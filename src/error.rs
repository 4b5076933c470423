// Error types for corpus extraction.
//
// Per-score failures (`ScoreError`) exclude one score from the run and are
// only logged. Run-level failures (`RunError`) abort before anything
// inconsistent is written.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons a single score is excluded from the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// A part identifier is not in the voice synonym table
    #[error("unrecognized voice {voice:?}")]
    UnrecognizedVoice { voice: String },

    /// Timed encodings only accept scores whose first time signature is 4/4
    #[error("unsupported time signature {found}")]
    UnsupportedTimeSignature { found: String },

    /// An event does not span a whole, positive number of frames
    #[error("could not quantize {score} into constant timesteps: {duration} quarters in voice {voice}")]
    QuantizationFailure {
        score: String,
        voice: String,
        duration: String,
    },

    /// Key analysis produced something other than major or minor
    #[error("unrecognized key mode {mode:?}")]
    KeyModeUnrecognized { mode: String },

    /// The tonic spelling has no entry in the transposition tables
    #[error("no transposition for tonic {tonic:?}")]
    UnrecognizedTonic { tonic: String },

    /// Transposition moved a note outside of MIDI range
    #[error("transposing {midi} by {semitones} leaves MIDI range")]
    PitchOutOfRange { midi: u8, semitones: i8 },

    /// Two parts canonicalized to the same voice
    #[error("two parts encode to {key:?}")]
    DuplicateVoice { key: String },
}

/// Failures while reading the corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid score {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failures that abort a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("vocabulary needs {needed} codes but the code space only has {available}")]
    VocabularyCapacityExceeded { needed: usize, available: usize },

    #[error("two output units share the key {0:?}")]
    DuplicateOutputKey(String),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid vocabulary file: {0}")]
    Vocabulary(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
