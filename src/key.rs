// This module provides the following structs:
// Key: a pitch class (one of the 12 semitones in Western tuning)
// Note: a note, with same values as MIDI (0 is C-1, 60 is C4, etc.)
// NamedKey: a pitch class that is spelled a certain way (e.g. C# or D-).
// NamedNote: a note that is spelled a certain way (e.g. C#4 or D-4).

// Spellings follow the score metadata convention: `-` is a flat and `#` a
// sharp, so B-flat is written `B-` and the pitch below it `B--` never shows
// up in practice. Parsing also accepts `b`, `♭`, `♯`, `x` and `𝄪`.

use regex::Regex;
use std::fmt::{self, Debug, Display};
use std::ops::Add;
use std::str::FromStr;
use std::sync::OnceLock;

// Represents any of the 12 distinct pitch classes in Western tuning
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct Key(i8);

impl Key {
    pub fn new(key: i8) -> Self {
        Self(key.rem_euclid(12))
    }

    pub fn pitch_class(&self) -> i8 {
        self.0
    }

    /// Spelling used when a bare MIDI number has to be named. Matches the
    /// spelling of the score sources: sharps, except for E- and B-.
    pub fn get_default_named_key(&self) -> NamedKey {
        match self.0 {
            0 => NamedKey::new(BaseKey::C, KeyModifier::Natural),
            1 => NamedKey::new(BaseKey::C, KeyModifier::Sharp),
            2 => NamedKey::new(BaseKey::D, KeyModifier::Natural),
            3 => NamedKey::new(BaseKey::E, KeyModifier::Flat),
            4 => NamedKey::new(BaseKey::E, KeyModifier::Natural),
            5 => NamedKey::new(BaseKey::F, KeyModifier::Natural),
            6 => NamedKey::new(BaseKey::F, KeyModifier::Sharp),
            7 => NamedKey::new(BaseKey::G, KeyModifier::Natural),
            8 => NamedKey::new(BaseKey::G, KeyModifier::Sharp),
            9 => NamedKey::new(BaseKey::A, KeyModifier::Natural),
            10 => NamedKey::new(BaseKey::B, KeyModifier::Flat),
            11 => NamedKey::new(BaseKey::B, KeyModifier::Natural),
            _ => unreachable!("keys are kept between 0 and 11"),
        }
    }

    /// Spelling used for the tonic of a detected key. Every pitch class maps
    /// onto one of the spellings of the transposition tables.
    pub fn get_tonic_named_key(&self) -> NamedKey {
        match self.0 {
            1 => NamedKey::new(BaseKey::D, KeyModifier::Flat),
            8 => NamedKey::new(BaseKey::A, KeyModifier::Flat),
            _ => self.get_default_named_key(),
        }
    }
}

// Allow adding an offset to a key. This wraps around.
impl Add<i8> for Key {
    type Output = Key;
    fn add(self, rhs: i8) -> Self::Output {
        Key::new(self.0 + rhs.rem_euclid(12))
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get_default_named_key())
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

// A wrapper around a note, with the height being the same as in MIDI
// (0 is C-1, 60 is C4 etc.)
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Note(pub u8);

impl Note {
    pub const MAX: u8 = 127;

    pub fn new(midi: u8) -> Option<Self> {
        (midi <= Self::MAX).then_some(Self(midi))
    }

    pub fn midi(&self) -> u8 {
        self.0
    }

    pub fn key(&self) -> Key {
        Key::new((self.0 % 12) as i8)
    }

    // Decompose a Note into its Key and octave
    pub fn decompose(&self) -> (Key, i8) {
        let octave = (self.0 / 12) as i8 - 1;
        (self.key(), octave)
    }

    // Create a Note from a Key and octave, if it lands in MIDI range.
    // C-1 is 0, C0 is 12.
    pub fn compose(key: Key, octave: i8) -> Option<Self> {
        let midi = i16::from(key.0) + (i16::from(octave) + 1) * 12;
        u8::try_from(midi).ok().and_then(Self::new)
    }

    /// Shift by a signed number of semitones, staying inside MIDI range.
    pub fn transpose(&self, semitones: i8) -> Option<Self> {
        let midi = i16::from(self.0) + i16::from(semitones);
        u8::try_from(midi).ok().and_then(Self::new)
    }

    pub fn get_default_named_note(&self) -> NamedNote {
        let (key, octave) = self.decompose();
        NamedNote::new(key.get_default_named_key(), octave)
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get_default_named_note())
    }
}

impl Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self, self.0)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub enum KeyModifier {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl KeyModifier {
    pub fn get_value(&self) -> i8 {
        match self {
            KeyModifier::DoubleFlat => -2,
            KeyModifier::Flat => -1,
            KeyModifier::Natural => 0,
            KeyModifier::Sharp => 1,
            KeyModifier::DoubleSharp => 2,
        }
    }
}

impl Display for KeyModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_modifier_str = match self {
            KeyModifier::DoubleFlat => "--",
            KeyModifier::Flat => "-",
            KeyModifier::Natural => "",
            KeyModifier::Sharp => "#",
            KeyModifier::DoubleSharp => "##",
        };
        write!(f, "{}", key_modifier_str)
    }
}

impl Debug for KeyModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub enum BaseKey {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl BaseKey {
    pub fn to_key(&self) -> Key {
        let key = match self {
            Self::C => 0,
            Self::D => 2,
            Self::E => 4,
            Self::F => 5,
            Self::G => 7,
            Self::A => 9,
            Self::B => 11,
        };
        Key::new(key)
    }
}

impl Display for BaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base_key_str = match self {
            BaseKey::C => "C",
            BaseKey::D => "D",
            BaseKey::E => "E",
            BaseKey::F => "F",
            BaseKey::G => "G",
            BaseKey::A => "A",
            BaseKey::B => "B",
        };
        write!(f, "{}", base_key_str)
    }
}

impl Debug for BaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedKey {
    pub base_key: BaseKey,
    pub key_modifier: KeyModifier,
}

impl NamedKey {
    pub fn new(base_key: BaseKey, key_modifier: KeyModifier) -> Self {
        NamedKey {
            base_key,
            key_modifier,
        }
    }
    pub fn to_key(&self) -> Key {
        self.base_key.to_key() + self.key_modifier.get_value()
    }
}

fn named_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^([A-G])(--|##|[-b♭#♯x𝄪])?$").expect("valid key regex"))
}

// The octave is a single digit: with `-` meaning flat, "C-1" reads as
// C-flat 1, never as C in octave -1.
fn named_note_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("^([A-G](?:--|##|[-b♭#♯x𝄪])?)([0-9])$").expect("valid note regex")
    })
}

impl FromStr for NamedKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = named_key_regex()
            .captures(s)
            .ok_or_else(|| format!("Invalid key: {}", s))?;

        let base_key = match &captures[1] {
            "C" => Ok(BaseKey::C),
            "D" => Ok(BaseKey::D),
            "E" => Ok(BaseKey::E),
            "F" => Ok(BaseKey::F),
            "G" => Ok(BaseKey::G),
            "A" => Ok(BaseKey::A),
            "B" => Ok(BaseKey::B),
            _ => Err(format!("Invalid key: {} ", s)),
        }?;

        let key_modifier = match captures.get(2) {
            None => Ok(KeyModifier::Natural),
            Some(modifier_match) => match modifier_match.as_str() {
                "--" => Ok(KeyModifier::DoubleFlat),
                "-" | "b" | "♭" => Ok(KeyModifier::Flat),
                "#" | "♯" => Ok(KeyModifier::Sharp),
                "##" | "x" | "𝄪" => Ok(KeyModifier::DoubleSharp),
                _ => Err(format!("Invalid key: {}", s)),
            },
        }?;

        Ok(Self::new(base_key, key_modifier))
    }
}

impl Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base_key, self.key_modifier)
    }
}

impl Debug for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedNote {
    key: NamedKey,
    octave: i8,
}

impl NamedNote {
    pub fn new(key: NamedKey, octave: i8) -> Self {
        NamedNote { key, octave }
    }
    pub fn to_note(&self) -> Option<Note> {
        // Go through the base key so that C-5 is B4 and B#4 is C5
        Note::compose(self.key.base_key.to_key(), self.octave)?
            .transpose(self.key.key_modifier.get_value())
    }
}

impl FromStr for NamedNote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = named_note_regex()
            .captures(s)
            .ok_or_else(|| format!("Invalid note: {}", s))?;

        let key = NamedKey::from_str(&captures[1])?;
        let octave: i8 = str::parse(&captures[2]).map_err(|_| format!("Invalid note: {}", s))?;

        Ok(Self::new(key, octave))
    }
}

impl Display for NamedNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.key, self.octave)
    }
}

impl Debug for NamedNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_keys() {
        let flats = ["B-", "Bb", "B♭"].map(|s| str::parse::<NamedKey>(s).unwrap());
        for key in flats {
            assert_eq!(key.to_key(), Key::new(10));
            assert_eq!(key.to_string(), "B-");
        }
        assert_eq!(str::parse::<NamedKey>("F#").unwrap().to_key(), Key::new(6));
        assert_eq!(str::parse::<NamedKey>("G-").unwrap().to_key(), Key::new(6));
        assert!(str::parse::<NamedKey>("H").is_err());
    }

    #[test]
    fn can_name_notes() {
        let names: Vec<String> = [60, 61, 63, 66, 68, 70, 71]
            .into_iter()
            .map(|midi| Note(midi).to_string())
            .collect();
        assert_eq!(names, ["C4", "C#4", "E-4", "F#4", "G#4", "B-4", "B4"]);
    }

    #[test]
    fn can_parse_notes() {
        let cases = [("C4", 60), ("B-3", 58), ("F#5", 78), ("C-5", 71), ("B#4", 72), ("A0", 21)];
        for (name, midi) in cases {
            let note = str::parse::<NamedNote>(name).unwrap();
            assert_eq!(note.to_note(), Some(Note(midi)), "{}", name);
        }
        assert!(str::parse::<NamedNote>("C").is_err());
    }

    #[test]
    fn transpose_stays_in_range() {
        assert_eq!(Note(60).transpose(-3), Some(Note(57)));
        assert_eq!(Note(126).transpose(2), None);
        assert_eq!(Note(1).transpose(-2), None);
    }

    #[test]
    fn tonic_spellings_prefer_flats() {
        let names: Vec<String> = (0..12)
            .map(|pc| Key::new(pc).get_tonic_named_key().to_string())
            .collect();
        assert_eq!(
            names,
            ["C", "D-", "D", "E-", "E", "F", "F#", "G", "A-", "A", "B-", "B"]
        );
    }
}
