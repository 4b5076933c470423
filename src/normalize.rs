// Key normalization: every score is transposed so that major pieces end up
// in C major and minor pieces in A minor, by the smallest shift.

use log::debug;

use super::analysis::{KeyAnalyzer, Mode, Tonality};
use super::error::ScoreError;
use super::key::{BaseKey, KeyModifier, NamedKey};
use super::score::{DeclaredKey, Score};

// Semitones from each tonic to C, spelled as the analysis spells tonics.
const MAJOR_SHIFTS: [(&str, i8); 13] = [
    ("A-", 4),
    ("A", 3),
    ("B-", 2),
    ("B", 1),
    ("C", 0),
    ("D-", -1),
    ("D", -2),
    ("E-", -3),
    ("E", -4),
    ("F", -5),
    ("F#", 6),
    ("G-", 6),
    ("G", 5),
];

// Semitones from each tonic to A.
const MINOR_SHIFTS: [(&str, i8); 13] = [
    ("A-", 1),
    ("A", 0),
    ("B-", -1),
    ("B", -2),
    ("C", -3),
    ("D-", -4),
    ("D", -5),
    ("E-", 6),
    ("E", 5),
    ("F", 4),
    ("F#", 3),
    ("G-", 3),
    ("G", 2),
];

/// The shift that takes `tonality` to C major or A minor.
pub fn transposition_for(tonality: &Tonality) -> Result<i8, ScoreError> {
    let table: &[(&str, i8)] = match tonality.mode {
        Mode::Major => &MAJOR_SHIFTS,
        Mode::Minor => &MINOR_SHIFTS,
    };
    let tonic = tonality.tonic.to_string();
    table
        .iter()
        .find(|(name, _)| *name == tonic)
        .map(|(_, shift)| *shift)
        .ok_or(ScoreError::UnrecognizedTonic { tonic })
}

pub fn normalized_tonality(mode: Mode) -> Tonality {
    let base_key = match mode {
        Mode::Major => BaseKey::C,
        Mode::Minor => BaseKey::A,
    };
    Tonality {
        tonic: NamedKey::new(base_key, KeyModifier::Natural),
        mode,
    }
}

/// Analyze the key of `score`, transpose its notes and key signatures by the
/// matching shift, and return the key the score is now in.
pub fn normalize_key(score: &mut Score, analyzer: &dyn KeyAnalyzer) -> Result<Tonality, ScoreError> {
    let original = analyzer.analyze(score)?;
    let shift = transposition_for(&original)?;
    debug!("{}: {} -> shift {}", score.id, original, shift);

    score.transpose(shift)?;
    score.transpose_key_signatures(shift);

    let normalized = normalized_tonality(original.mode);
    score.declared_key = Some(DeclaredKey {
        tonic: normalized.tonic.to_string(),
        mode: normalized.mode.to_string(),
    });
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{self, KrumhanslSchmuckler};
    use crate::key::Key;
    use crate::score::tests::{part, quarters, score};
    use crate::score::KeySignature;

    fn tonality(tonic: &str, mode: Mode) -> Tonality {
        Tonality {
            tonic: str::parse::<NamedKey>(tonic).unwrap(),
            mode,
        }
    }

    #[test]
    fn every_table_entry_lands_on_c_or_a() {
        for (table, mode, target) in [(&MAJOR_SHIFTS, Mode::Major, 0), (&MINOR_SHIFTS, Mode::Minor, 9)] {
            for (tonic, shift) in table.iter() {
                let key = str::parse::<NamedKey>(tonic).unwrap().to_key();
                assert_eq!(key + *shift, Key::new(target), "{} {}", tonic, mode);
                assert!(shift.abs() <= 6);
                assert_eq!(transposition_for(&tonality(tonic, mode)), Ok(*shift));
            }
        }
    }

    #[test]
    fn unknown_spelling_is_rejected() {
        assert_eq!(
            transposition_for(&tonality("C#", Mode::Minor)),
            Err(ScoreError::UnrecognizedTonic {
                tonic: "C#".to_string()
            })
        );
    }

    #[test]
    fn normalizes_g_major_to_c_major() {
        // G major: G A B C D E F# G, ending on the tonic triad
        let events: Vec<_> = [67, 69, 71, 72, 74, 76, 78, 79, 74, 71, 67]
            .into_iter()
            .map(|p| (p, quarters(1, 1)))
            .collect();
        let mut sc = score("bwv1", vec![part("Soprano", &events)]);
        sc.key_signatures = vec![KeySignature { sharps: 1 }];

        let key = normalize_key(&mut sc, &KrumhanslSchmuckler).unwrap();
        assert_eq!(key, tonality("C", Mode::Major));
        assert_eq!(sc.parts[0].events[0].pitch.map(|n| n.midi()), Some(72));
        assert_eq!(sc.key_signatures, vec![KeySignature { sharps: 0 }]);

        // The transposed notes analyze as the normalized key too.
        assert_eq!(KrumhanslSchmuckler.analyze(&sc), Ok(key));
        assert_eq!(analysis::DeclaredKey.analyze(&sc), Ok(key));
    }

    #[test]
    fn normalizes_minor_to_a_minor() {
        // D harmonic minor
        let events: Vec<_> = [62, 64, 65, 67, 69, 70, 73, 74, 69, 65, 62]
            .into_iter()
            .map(|p| (p, quarters(1, 1)))
            .collect();
        let mut sc = score("bwv2", vec![part("Bass", &events)]);
        sc.key_signatures = vec![KeySignature { sharps: -1 }];

        let key = normalize_key(&mut sc, &KrumhanslSchmuckler).unwrap();
        assert_eq!(key, tonality("A", Mode::Minor));
        assert_eq!(sc.parts[0].events[0].pitch.map(|n| n.midi()), Some(57));
        assert_eq!(sc.key_signatures, vec![KeySignature { sharps: 0 }]);
        assert_eq!(KrumhanslSchmuckler.analyze(&sc), Ok(key));
    }

    #[test]
    fn declared_c_sharp_minor_reaches_a_minor() {
        let events: Vec<_> = [61, 63, 64, 66, 68, 69, 72, 73, 68, 64, 61]
            .into_iter()
            .map(|p| (p, quarters(1, 1)))
            .collect();
        let mut sc = score("bwv3", vec![part("Soprano", &events)]);
        sc.key_signatures = vec![KeySignature { sharps: 4 }];
        sc.declared_key = Some(DeclaredKey {
            tonic: "C#".to_string(),
            mode: "minor".to_string(),
        });

        let key = normalize_key(&mut sc, &analysis::DeclaredKey).unwrap();
        assert_eq!(key, tonality("A", Mode::Minor));
        assert_eq!(sc.parts[0].events[0].pitch.map(|n| n.midi()), Some(57));
        assert_eq!(sc.key_signatures, vec![KeySignature { sharps: 0 }]);
    }
}
