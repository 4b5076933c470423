// Builds token corpora from four-voice chorales.
//
// Scores are canonicalized (voice names, key), encoded voice by voice into
// string tokens, and written as plain text plus a single-character encoding
// that shares one vocabulary across the run.

pub mod analysis;
pub mod config;
pub mod corpus;
pub mod encode;
pub mod error;
pub mod json_input;
pub mod key;
pub mod normalize;
pub mod poly;
pub mod runner;
pub mod score;
pub mod vocabulary;
pub mod voices;
