//! Lemmatization module
//!
//! Turns raw page text into counts of normalized word forms. The
//! [`Lemmatizer`] trait is the seam to the morphological analyzer; the crate
//! ships a Snowball-based implementation.

mod snowball;
mod tokenizer;

use serde::Deserialize;

pub use snowball::SnowballLemmatizer;
pub use tokenizer::{count_lemmas, find_lemma_matches, query_lemmas, tokenize};

/// Natural language whose alphabet and morphology are indexed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Russian,
    English,
}

impl Language {
    /// Returns true if the lowercase character belongs to the language alphabet
    pub fn in_alphabet(&self, c: char) -> bool {
        match self {
            Self::Russian => ('а'..='я').contains(&c) || c == 'ё',
            Self::English => c.is_ascii_lowercase(),
        }
    }
}

/// Result of normalizing one word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordForms {
    /// Base forms of the word; empty if the analyzer knows none
    pub base_forms: Vec<String>,

    /// True for non-content parts of speech (prepositions, conjunctions,
    /// particles, interjections) that are never indexed
    pub discardable: bool,
}

/// Morphological analyzer contract
///
/// Implementations must be deterministic for a given word and only receive
/// lowercase words made of their language's alphabet.
pub trait Lemmatizer: Send + Sync {
    fn language(&self) -> Language;

    fn normalize(&self, word: &str) -> WordForms;
}
