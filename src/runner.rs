// Corpus runner: fans the whole corpus out over a worker pool, waits for
// every score, then builds one vocabulary and writes the files.
//
// Nothing is written until all scores are processed and the vocabulary is
// complete, since every file of a run is encoded with that vocabulary.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{info, warn};
use rayon::prelude::*;

use super::analysis::KeyAnalyzer;
use super::config::Config;
use super::encode::{Encoder, OutputUnit};
use super::error::{RunError, ScoreError};
use super::normalize::normalize_key;
use super::score::Score;
use super::vocabulary::{CodeSpace, Vocabulary};
use super::voices::canonicalize;

pub const VOCABULARY_FILE: &str = "utf_to_txt.json";

/// Canonical voices, then the encoder's own gate, then key normalization,
/// then encoding. A score whose parts share a voice fails here, before its
/// units can clash in the merge.
pub fn process_score(
    mut score: Score,
    encoder: &dyn Encoder,
    analyzer: &dyn KeyAnalyzer,
) -> Result<Vec<OutputUnit>, ScoreError> {
    canonicalize(&mut score)?;
    encoder.accepts(&score)?;
    let key = normalize_key(&mut score, analyzer)?;
    info!("Processing {} ({})", score.id, key.mode);
    let units = encoder.encode(&score, &key)?;

    let mut keys = HashSet::new();
    if let Some(repeated) = units.iter().find(|unit| !keys.insert(unit.key.as_str())) {
        return Err(ScoreError::DuplicateVoice {
            key: repeated.key.clone(),
        });
    }
    Ok(units)
}

/// Everything collected from a corpus, before any vocabulary exists.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Non-empty units, in corpus order
    pub units: Vec<OutputUnit>,
    pub skipped: Vec<(String, ScoreError)>,
}

pub fn extract(
    scores: Vec<Score>,
    encoder: &dyn Encoder,
    analyzer: &dyn KeyAnalyzer,
) -> Result<Extraction, RunError> {
    let results: Vec<(String, Result<Vec<OutputUnit>, ScoreError>)> = scores
        .into_par_iter()
        .map(|score| {
            let id = score.id.clone();
            (id, process_score(score, encoder, analyzer))
        })
        .collect();

    let mut units: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut skipped = Vec::new();
    for (id, result) in results {
        match result {
            Ok(score_units) => {
                for unit in score_units.into_iter().filter(|unit| !unit.tokens.is_empty()) {
                    if units.contains_key(&unit.key) {
                        return Err(RunError::DuplicateOutputKey(unit.key));
                    }
                    units.insert(unit.key, unit.tokens);
                }
            }
            Err(err) => {
                warn!("Skipping {}: {}", id, err);
                skipped.push((id, err));
            }
        }
    }

    Ok(Extraction {
        units: units
            .into_iter()
            .map(|(key, tokens)| OutputUnit { key, tokens })
            .collect(),
        skipped,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), RunError> {
    info!("Writing {}", path.display());
    fs::write(path, contents).map_err(|source| RunError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the vocabulary and a `.txt`/`.utf` pair per unit, replacing any
/// files left by an earlier run.
pub fn write_outputs(dir: &Path, units: &[OutputUnit], vocabulary: &Vocabulary) -> Result<(), RunError> {
    fs::create_dir_all(dir).map_err(|source| RunError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    write_file(
        &dir.join(VOCABULARY_FILE),
        &serde_json::to_string(&vocabulary.to_json())?,
    )?;

    for unit in units {
        let encoded = vocabulary.encode(&unit.tokens).ok_or_else(|| {
            RunError::Vocabulary(format!("{} has tokens outside the vocabulary", unit.key))
        })?;
        write_file(&dir.join(format!("{}.txt", unit.key)), &unit.tokens.join("\n"))?;
        write_file(&dir.join(format!("{}.utf", unit.key)), &encoded)?;
    }
    Ok(())
}

#[derive(Debug)]
pub struct RunSummary {
    pub units_written: usize,
    pub vocabulary_size: usize,
    pub skipped: Vec<(String, ScoreError)>,
}

pub fn run(
    scores: Vec<Score>,
    encoder: &dyn Encoder,
    analyzer: &dyn KeyAnalyzer,
    config: &Config,
) -> Result<RunSummary, RunError> {
    let scores: Vec<Score> = match config.subset {
        Some(subset) => scores.into_iter().take(subset).collect(),
        None => scores,
    };
    info!("Extracting {} scores with {}", scores.len(), encoder.name());

    let extraction = match config.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(|| extract(scores, encoder, analyzer))?,
        None => extract(scores, encoder, analyzer)?,
    };

    let vocabulary = build_vocabulary(&extraction.units, &config.code_space())?;
    write_outputs(&config.output_dir, &extraction.units, &vocabulary)?;

    Ok(RunSummary {
        units_written: extraction.units.len(),
        vocabulary_size: vocabulary.len(),
        skipped: extraction.skipped,
    })
}

fn build_vocabulary(units: &[OutputUnit], space: &CodeSpace) -> Result<Vocabulary, RunError> {
    let vocabulary = Vocabulary::build(units, space)?;
    info!("Vocabulary has {} tokens", vocabulary.len());
    Ok(vocabulary)
}
