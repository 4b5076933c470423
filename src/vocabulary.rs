// Token vocabulary shared by every file of a run.
//
// Each distinct token gets one single-character code. Codes come from a
// `CodeSpace` that never contains control or whitespace characters, so
// the START and END sentinels (both control characters) cannot collide
// with content codes and encoded files stay one code per line.

use std::fs;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use super::encode::OutputUnit;
use super::error::RunError;

pub const START_DELIM: char = '\u{0002}';
pub const END_DELIM: char = '\u{0003}';
pub const START_LABEL: &str = "START";
pub const END_LABEL: &str = "END";

/// The characters available as content codes, in assignment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSpace {
    first: u32,
    len: usize,
}

impl CodeSpace {
    pub const DEFAULT_FIRST: u32 = 0x21;

    /// Every usable character from `first` up.
    pub fn starting_at(first: u32) -> Self {
        Self {
            first,
            len: usize::MAX,
        }
    }

    /// At most `len` usable characters from `first` up.
    pub fn bounded(first: u32, len: usize) -> Self {
        Self { first, len }
    }

    pub fn codes(&self) -> impl Iterator<Item = char> {
        (self.first..=char::MAX as u32)
            .filter_map(char::from_u32)
            .filter(|c| !c.is_control() && !c.is_whitespace())
            .take(self.len)
    }
}

impl Default for CodeSpace {
    fn default() -> Self {
        Self::starting_at(Self::DEFAULT_FIRST)
    }
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_to_code: IndexMap<String, char>,
    code_to_token: IndexMap<char, String>,
}

impl Vocabulary {
    /// Assign codes to the distinct tokens of `units`, in first-seen order.
    /// Fails if the code space runs out before the tokens do.
    pub fn build(units: &[OutputUnit], space: &CodeSpace) -> Result<Self, RunError> {
        let tokens: IndexSet<&str> = units
            .iter()
            .flat_map(|unit| unit.tokens.iter().map(String::as_str))
            .collect();

        let mut token_to_code = IndexMap::with_capacity(tokens.len());
        let mut codes = space.codes();
        for (assigned, token) in tokens.iter().enumerate() {
            let code = codes.next().ok_or(RunError::VocabularyCapacityExceeded {
                needed: tokens.len(),
                available: assigned,
            })?;
            token_to_code.insert(token.to_string(), code);
        }

        let code_to_token = token_to_code
            .iter()
            .map(|(token, code)| (*code, token.clone()))
            .collect();
        Ok(Self {
            token_to_code,
            code_to_token,
        })
    }

    /// Number of content tokens, sentinels excluded.
    pub fn len(&self) -> usize {
        self.token_to_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_code.is_empty()
    }

    pub fn code(&self, token: &str) -> Option<char> {
        self.token_to_code.get(token).copied()
    }

    pub fn token(&self, code: char) -> Option<&str> {
        self.code_to_token.get(&code).map(String::as_str)
    }

    /// Codes for `tokens`, one per line.
    pub fn encode(&self, tokens: &[String]) -> Option<String> {
        let codes = tokens
            .iter()
            .map(|token| self.code(token).map(String::from))
            .collect::<Option<Vec<String>>>()?;
        Some(codes.join("\n"))
    }

    /// The `utf_to_txt.json` object: code to token, plus both sentinels.
    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(self.len() + 2);
        for (code, token) in self.code_to_token.iter() {
            map.insert(code.to_string(), Value::String(token.clone()));
        }
        map.insert(START_DELIM.to_string(), Value::String(START_LABEL.to_string()));
        map.insert(END_DELIM.to_string(), Value::String(END_LABEL.to_string()));
        Value::Object(map)
    }
}

/// Reads a `utf_to_txt.json` back to turn encoded files into tokens.
#[derive(Debug, Clone)]
pub struct Decoder {
    code_to_token: IndexMap<char, String>,
}

impl Decoder {
    pub fn from_json(input: &str) -> Result<Self, RunError> {
        let json: Value = serde_json::from_str(input)?;
        let entries = json
            .as_object()
            .ok_or_else(|| RunError::Vocabulary("should be a JSON object".to_string()))?;

        let mut code_to_token = IndexMap::with_capacity(entries.len());
        for (code, token) in entries {
            let mut chars = code.chars();
            let code = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(RunError::Vocabulary(format!("{:?} is not a single character", code))),
            };
            let token = token
                .as_str()
                .ok_or_else(|| RunError::Vocabulary(format!("token for {:?} should be a string", code)))?;
            code_to_token.insert(code, token.to_string());
        }
        Ok(Self { code_to_token })
    }

    pub fn load(path: &Path) -> Result<Self, RunError> {
        let input = fs::read_to_string(path).map_err(|source| RunError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&input)
    }

    /// Tokens of an encoded file body, one code per line.
    pub fn decode(&self, encoded: &str) -> Result<Vec<String>, RunError> {
        if encoded.is_empty() {
            return Ok(Vec::new());
        }
        encoded
            .split('\n')
            .map(|line| {
                let mut chars = line.chars();
                match (chars.next(), chars.next()) {
                    (Some(code), None) => self
                        .code_to_token
                        .get(&code)
                        .cloned()
                        .ok_or_else(|| RunError::Vocabulary(format!("unknown code {:?}", code))),
                    _ => Err(RunError::Vocabulary(format!("malformed line {:?}", line))),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn unit(key: &str, tokens: &[&str]) -> OutputUnit {
        OutputUnit {
            key: key.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn corpus() -> Vec<OutputUnit> {
        vec![
            unit("a", &["60,1.0", "REST,0.5", "60,1.0", "62,0.5"]),
            unit("b", &["62,0.5", "64,2.0", "\"quoted\""]),
        ]
    }

    #[test]
    fn assigns_a_bijection() {
        let vocabulary = Vocabulary::build(&corpus(), &CodeSpace::default()).unwrap();
        assert_eq!(vocabulary.len(), 5);

        let codes: HashSet<char> = ["60,1.0", "REST,0.5", "62,0.5", "64,2.0", "\"quoted\""]
            .iter()
            .map(|token| vocabulary.code(token).unwrap())
            .collect();
        assert_eq!(codes.len(), 5);
        for code in codes {
            assert!(!code.is_control() && !code.is_whitespace());
            let token = vocabulary.token(code).unwrap();
            assert_eq!(vocabulary.code(token), Some(code));
        }
    }

    #[test]
    fn json_has_sentinels() {
        let vocabulary = Vocabulary::build(&corpus(), &CodeSpace::default()).unwrap();
        let json = vocabulary.to_json();
        let entries = json.as_object().unwrap();
        assert_eq!(entries.len(), vocabulary.len() + 2);
        assert_eq!(entries["\u{0002}"], "START");
        assert_eq!(entries["\u{0003}"], "END");
    }

    #[test]
    fn capacity_is_enforced() {
        let space = CodeSpace::bounded(CodeSpace::DEFAULT_FIRST, 4);
        match Vocabulary::build(&corpus(), &space) {
            Err(RunError::VocabularyCapacityExceeded { needed, available }) => {
                assert_eq!(needed, 5);
                assert_eq!(available, 4);
            }
            other => panic!("expected capacity failure, got {:?}", other),
        }

        let space = CodeSpace::bounded(CodeSpace::DEFAULT_FIRST, 5);
        assert!(Vocabulary::build(&corpus(), &space).is_ok());
    }

    #[test]
    fn code_space_skips_control_and_whitespace() {
        let codes: Vec<char> = CodeSpace::bounded(0, 3).codes().collect();
        assert_eq!(codes, ['!', '"', '#']);
        assert!(CodeSpace::starting_at(0x7f).codes().next().unwrap() > '\u{9f}');
    }

    #[test]
    fn decoding_restores_tokens() {
        let units = corpus();
        let vocabulary = Vocabulary::build(&units, &CodeSpace::default()).unwrap();
        let json = serde_json::to_string(&vocabulary.to_json()).unwrap();
        let decoder = Decoder::from_json(&json).unwrap();

        for unit in units.iter() {
            let encoded = vocabulary.encode(&unit.tokens).unwrap();
            assert_eq!(encoded.lines().count(), unit.tokens.len());
            assert_eq!(decoder.decode(&encoded).unwrap(), unit.tokens);
        }
        assert!(decoder.decode("\u{0002}").unwrap() == ["START"]);
    }
}
