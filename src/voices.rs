// Canonical voice names. Part identifiers in the chorale sources are
// inconsistent ("S.", "Soprano 1", ...), so every part is renamed to one of
// the four canonical voices before extraction.

use std::fmt::{self, Display};

use super::error::ScoreError;
use super::score::{Part, Score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Voice {
    Soprano,
    Alto,
    Tenor,
    Bass,
}

// Matching is exact: case, punctuation and embedded carriage returns count.
const SYNONYMS: [(Voice, &[&str]); 4] = [
    (
        Voice::Soprano,
        &["Soprano", "S.", "Soprano 1", "Soprano\rOboe 1\rViolin1"],
    ),
    (Voice::Alto, &["Alto", "A."]),
    (Voice::Tenor, &["Tenor", "T."]),
    (Voice::Bass, &["Bass", "B."]),
];

impl Voice {
    pub fn name(&self) -> &'static str {
        match self {
            Voice::Soprano => "Soprano",
            Voice::Alto => "Alto",
            Voice::Tenor => "Tenor",
            Voice::Bass => "Bass",
        }
    }

    pub fn from_part_id(id: &str) -> Option<Voice> {
        SYNONYMS
            .iter()
            .find(|(_, synonyms)| synonyms.contains(&id))
            .map(|(voice, _)| *voice)
    }
}

impl Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Rename every part of `score` to its canonical voice name. If any part is
/// not recognized the score is left untouched and the first offending id is
/// reported.
pub fn canonicalize(score: &mut Score) -> Result<(), ScoreError> {
    let voices = score
        .parts
        .iter()
        .map(|part| {
            Voice::from_part_id(&part.id).ok_or_else(|| ScoreError::UnrecognizedVoice {
                voice: part.id.clone(),
            })
        })
        .collect::<Result<Vec<Voice>, ScoreError>>()?;

    for (part, voice) in score.parts.iter_mut().zip(voices) {
        part.id = voice.name().to_string();
    }
    Ok(())
}

/// The part carrying `voice`, provided exactly one part does.
pub fn find_part(score: &Score, voice: Voice) -> Option<&Part> {
    let mut matching = score.parts.iter().filter(|part| part.id == voice.name());
    match (matching.next(), matching.next()) {
        (Some(part), None) => Some(part),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::tests::{part, quarters, score};

    fn satb(ids: [&str; 4]) -> Score {
        let parts = ids
            .iter()
            .map(|id| part(id, &[(60, quarters(1, 1))]))
            .collect();
        score("bwv1", parts)
    }

    #[test]
    fn renames_synonyms() {
        let mut sc = satb(["S.", "A.", "T.", "B."]);
        canonicalize(&mut sc).unwrap();
        let ids: Vec<&str> = sc.parts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["Soprano", "Alto", "Tenor", "Bass"]);

        let mut sc = satb(["Soprano\rOboe 1\rViolin1", "Alto", "Tenor", "Bass"]);
        canonicalize(&mut sc).unwrap();
        assert_eq!(sc.parts[0].id, "Soprano");
    }

    #[test]
    fn canonicalizing_twice_is_a_no_op() {
        let mut sc = satb(["Soprano 1", "A.", "Tenor", "B."]);
        canonicalize(&mut sc).unwrap();
        let once = sc.clone();
        canonicalize(&mut sc).unwrap();
        assert_eq!(sc, once);
    }

    #[test]
    fn rejects_whole_score_on_unknown_part() {
        let mut sc = satb(["S.", "Soprano 2", "T.", "B."]);
        let before = sc.clone();
        assert_eq!(
            canonicalize(&mut sc),
            Err(ScoreError::UnrecognizedVoice {
                voice: "Soprano 2".to_string()
            })
        );
        assert_eq!(sc, before);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let mut sc = satb(["soprano", "A.", "T.", "B."]);
        assert!(canonicalize(&mut sc).is_err());
    }

    #[test]
    fn finds_unique_part() {
        let mut sc = satb(["S.", "A.", "T.", "B."]);
        canonicalize(&mut sc).unwrap();
        assert_eq!(find_part(&sc, Voice::Tenor).map(|p| p.id.as_str()), Some("Tenor"));

        let mut doubled = satb(["S.", "Soprano", "T.", "B."]);
        canonicalize(&mut doubled).unwrap();
        assert!(find_part(&doubled, Voice::Soprano).is_none());
        assert!(find_part(&doubled, Voice::Alto).is_none());
    }
}
