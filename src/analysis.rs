// Key analysis. The normalizer only needs a (tonic, mode) pair, so the
// analysis sits behind a trait: Krumhansl-Schmuckler over the notes, or the
// key declared in the score metadata when there is one.

use std::fmt::{self, Display};
use std::str::FromStr;

use super::error::ScoreError;
use super::key::{Key, NamedKey};
use super::score::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

impl FromStr for Mode {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Mode::Major),
            "minor" => Ok(Mode::Minor),
            other => Err(ScoreError::KeyModeUnrecognized {
                mode: other.to_string(),
            }),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tonality {
    pub tonic: NamedKey,
    pub mode: Mode,
}

impl Display for Tonality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic, self.mode)
    }
}

pub trait KeyAnalyzer: Sync {
    fn analyze(&self, score: &Score) -> Result<Tonality, ScoreError>;
}

/// Krumhansl-Kessler major key profile.
const MAJOR_PROFILE: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];

/// Krumhansl-Kessler minor key profile.
const MINOR_PROFILE: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Correlates the duration-weighted pitch-class histogram of all parts
/// against the 24 rotated key profiles and keeps the best match. Ties go to
/// the lowest tonic, major before minor. A score without notes is C major.
#[derive(Debug, Default, Clone, Copy)]
pub struct KrumhanslSchmuckler;

impl KeyAnalyzer for KrumhanslSchmuckler {
    fn analyze(&self, score: &Score) -> Result<Tonality, ScoreError> {
        let mut histogram = [0.0_f64; 12];
        for (note, duration) in score.notes() {
            let pc = note.key().pitch_class() as usize;
            histogram[pc] += f64::from(*duration.numer()) / f64::from(*duration.denom());
        }

        let mut best = (0_i8, Mode::Major, f64::NEG_INFINITY);
        for root in 0..12_usize {
            let mut rotated = [0.0; 12];
            for (i, slot) in rotated.iter_mut().enumerate() {
                *slot = histogram[(i + root) % 12];
            }
            for (mode, profile) in [(Mode::Major, &MAJOR_PROFILE), (Mode::Minor, &MINOR_PROFILE)] {
                let corr = correlation(&rotated, profile);
                if corr > best.2 {
                    best = (root as i8, mode, corr);
                }
            }
        }

        let (root, mode, _) = best;
        Ok(Tonality {
            tonic: Key::new(root).get_tonic_named_key(),
            mode,
        })
    }
}

// Pearson correlation of a pitch-class histogram against a key profile.
// A flat histogram (no notes, or all twelve equally) correlates with nothing.
fn correlation(histogram: &[f64; 12], profile: &[f64; 12]) -> f64 {
    let mean = |values: &[f64; 12]| values.iter().sum::<f64>() / 12.0;
    let (h_mean, p_mean) = (mean(histogram), mean(profile));

    let (mut covariance, mut h_spread, mut p_spread) = (0.0, 0.0, 0.0);
    for (h, p) in histogram.iter().zip(profile.iter()) {
        let (dh, dp) = (h - h_mean, p - p_mean);
        covariance += dh * dp;
        h_spread += dh * dh;
        p_spread += dp * dp;
    }

    let spread = (h_spread * p_spread).sqrt();
    if spread < 1e-10 {
        0.0
    } else {
        covariance / spread
    }
}

/// Uses the key from the score metadata, falling back to
/// Krumhansl-Schmuckler for scores that declare none. The declared tonic is
/// respelled the way detected tonics are, so C# minor comes out as D- minor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredKey;

impl KeyAnalyzer for DeclaredKey {
    fn analyze(&self, score: &Score) -> Result<Tonality, ScoreError> {
        match &score.declared_key {
            Some(declared) => {
                let tonic = str::parse::<NamedKey>(&declared.tonic)
                    .map_err(|_| ScoreError::UnrecognizedTonic {
                        tonic: declared.tonic.clone(),
                    })?
                    .to_key()
                    .get_tonic_named_key();
                let mode = str::parse::<Mode>(&declared.mode)?;
                Ok(Tonality { tonic, mode })
            }
            None => KrumhanslSchmuckler.analyze(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::tests::{part, quarters, score};

    fn scale(pitches: &[i16]) -> Score {
        let events: Vec<_> = pitches.iter().map(|&p| (p, quarters(1, 1))).collect();
        score("scale", vec![part("Soprano", &events)])
    }

    #[test]
    fn detects_c_major() {
        let sc = scale(&[60, 62, 64, 65, 67, 69, 71, 72, 67, 64, 60]);
        let key = KrumhanslSchmuckler.analyze(&sc).unwrap();
        assert_eq!(key.tonic.to_string(), "C");
        assert_eq!(key.mode, Mode::Major);
    }

    #[test]
    fn detects_flat_keys_with_flat_spelling() {
        // E-flat major, tonic triad weighted
        let sc = scale(&[63, 65, 67, 68, 70, 72, 74, 75, 70, 67, 63]);
        let key = KrumhanslSchmuckler.analyze(&sc).unwrap();
        assert_eq!(key.tonic.to_string(), "E-");
        assert_eq!(key.mode, Mode::Major);
    }

    #[test]
    fn detects_minor() {
        // A harmonic minor with the leading tone
        let sc = scale(&[57, 59, 60, 62, 64, 65, 68, 69, 64, 60, 57]);
        let key = KrumhanslSchmuckler.analyze(&sc).unwrap();
        assert_eq!(key.tonic.to_string(), "A");
        assert_eq!(key.mode, Mode::Minor);
    }

    #[test]
    fn declared_key_wins_over_notes() {
        let mut sc = scale(&[60, 64, 67]);
        sc.declared_key = Some(crate::score::DeclaredKey {
            tonic: "Bb".to_string(),
            mode: "minor".to_string(),
        });
        let key = DeclaredKey.analyze(&sc).unwrap();
        assert_eq!(key.tonic.to_string(), "B-");
        assert_eq!(key.mode, Mode::Minor);
    }

    #[test]
    fn declared_sharp_tonics_take_table_spellings() {
        for (declared, expected) in [("C#", "D-"), ("G#", "A-"), ("D#", "E-"), ("A#", "B-"), ("C-", "B")] {
            let mut sc = scale(&[61, 64, 68]);
            sc.declared_key = Some(crate::score::DeclaredKey {
                tonic: declared.to_string(),
                mode: "minor".to_string(),
            });
            let key = DeclaredKey.analyze(&sc).unwrap();
            assert_eq!(key.tonic.to_string(), expected, "{}", declared);
        }
    }

    #[test]
    fn declared_mode_must_be_major_or_minor() {
        let mut sc = scale(&[62, 65, 69]);
        sc.declared_key = Some(crate::score::DeclaredKey {
            tonic: "D".to_string(),
            mode: "dorian".to_string(),
        });
        assert_eq!(
            DeclaredKey.analyze(&sc),
            Err(ScoreError::KeyModeUnrecognized {
                mode: "dorian".to_string()
            })
        );
    }
}
