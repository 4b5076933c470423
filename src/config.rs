// Run configuration: defaults, optionally overridden by a JSON file, then
// by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::analysis::{DeclaredKey, KeyAnalyzer, KrumhanslSchmuckler};
use super::error::RunError;
use super::vocabulary::CodeSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// Krumhansl-Schmuckler on the notes, ignoring metadata
    Krumhansl,
    /// Metadata key when present, Krumhansl-Schmuckler otherwise
    Declared,
}

impl AnalyzerKind {
    pub fn analyzer(&self) -> &'static dyn KeyAnalyzer {
        match self {
            AnalyzerKind::Krumhansl => &KrumhanslSchmuckler,
            AnalyzerKind::Declared => &DeclaredKey,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub corpus_dir: PathBuf,
    pub output_dir: PathBuf,
    pub frames_per_quarter: u32,
    pub note_start_marker: String,
    pub analyzer: AnalyzerKind,
    /// Only process the first N scores
    pub subset: Option<usize>,
    /// Worker threads; rayon's default pool when unset
    pub threads: Option<usize>,
    pub code_space_start: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("corpus"),
            output_dir: PathBuf::from("scratch"),
            frames_per_quarter: 4,
            note_start_marker: "<START>".to_string(),
            analyzer: AnalyzerKind::Declared,
            subset: None,
            threads: None,
            code_space_start: CodeSpace::DEFAULT_FIRST,
        }
    }
}

impl Config {
    pub fn from_json(input: &str) -> Result<Self, RunError> {
        let config: Config = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, RunError> {
        let input = fs::read_to_string(path).map_err(|source| RunError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&input)
    }

    pub fn validate(&self) -> Result<(), RunError> {
        if self.frames_per_quarter == 0 {
            return Err(RunError::Config("frames_per_quarter must be at least 1".to_string()));
        }
        if self.threads == Some(0) {
            return Err(RunError::Config("threads must be at least 1".to_string()));
        }
        if self.code_space_start > char::MAX as u32 {
            return Err(RunError::Config(format!(
                "code_space_start {:#x} is past the last character",
                self.code_space_start
            )));
        }
        Ok(())
    }

    pub fn code_space(&self) -> CodeSpace {
        CodeSpace::starting_at(self.code_space_start)
    }
}
