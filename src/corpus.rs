// Where scores come from. The runner only needs "all the scores"; the
// chorale collection on disk is a directory of JSON scores.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::error::CorpusError;
use super::json_input::parse_score;
use super::score::Score;

pub trait ScoreSource {
    fn scores(&self) -> Result<Vec<Score>, CorpusError>;
}

/// Every `*.json` file of a directory, in file-name order. Files that
/// cannot be read or parsed are logged and left out.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    dir: PathBuf,
}

impl DirectoryCorpus {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn score_paths(&self) -> Result<Vec<PathBuf>, CorpusError> {
        let io_error = |source| CorpusError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

pub fn load_score(path: &Path) -> Result<Score, CorpusError> {
    let input = fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_score(&input).map_err(|message| CorpusError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

impl ScoreSource for DirectoryCorpus {
    fn scores(&self) -> Result<Vec<Score>, CorpusError> {
        let paths = self.score_paths()?;
        info!("Loading {} scores from {}", paths.len(), self.dir.display());
        let mut scores = Vec::with_capacity(paths.len());
        for path in &paths {
            match load_score(path) {
                Ok(score) => scores.push(score),
                Err(err) => warn!("Skipping {}", err),
            }
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_json_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let score = |id: &str| format!(r#"{{"id": "{}", "time_signatures": ["4/4"], "parts": []}}"#, id);
        fs::write(dir.path().join("b.json"), score("bwv2")).unwrap();
        fs::write(dir.path().join("a.json"), score("bwv1")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a score").unwrap();

        let scores = DirectoryCorpus::new(dir.path()).scores().unwrap();
        let ids: Vec<&str> = scores.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["bwv1", "bwv2"]);
    }

    #[test]
    fn skips_broken_files() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{").unwrap();
        fs::write(dir.path().join("b.json"), r#"{"id": "bwv2", "parts": [{"id": "S.", "events": [[60, "1/2"]]}], "extra": 1}"#)
            .unwrap();
        fs::write(dir.path().join("c.json"), r#"{"id": "bwv3", "parts": []}"#).unwrap();

        let scores = DirectoryCorpus::new(dir.path()).scores().unwrap();
        let ids: Vec<&str> = scores.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["bwv3"]);
    }

    #[test]
    fn reports_the_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{").unwrap();

        match load_score(&broken) {
            Err(CorpusError::Parse { path, .. }) => assert_eq!(path, broken),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            DirectoryCorpus::new(&missing).scores(),
            Err(CorpusError::Io { .. })
        ));
    }
}
