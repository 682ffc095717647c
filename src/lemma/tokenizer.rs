use crate::lemma::Lemmatizer;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::OnceLock;

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    // Constant pattern, compiled once
    WORD.get_or_init(|| Regex::new(r"\p{L}+").expect("letter-run pattern compiles"))
}

/// Splits text into lowercase words of the lemmatizer's alphabet
///
/// Tokens are maximal runs of letters; a token containing any letter outside
/// the alphabet (for example a Latin word in Russian text) is dropped whole.
pub fn tokenize<'a>(text: &'a str, lemmatizer: &'a dyn Lemmatizer) -> impl Iterator<Item = String> + 'a {
    let language = lemmatizer.language();
    word_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(move |word| word.chars().all(|c| language.in_alphabet(c)))
}

/// Counts occurrences of each base form in `text`
///
/// Discardable words contribute nothing. A word with several base forms
/// counts once towards each of them.
pub fn count_lemmas(text: &str, lemmatizer: &dyn Lemmatizer) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for word in tokenize(text, lemmatizer) {
        let forms = lemmatizer.normalize(&word);
        if forms.discardable {
            continue;
        }
        for base in forms.base_forms {
            *counts.entry(base).or_insert(0) += 1;
        }
    }
    counts
}

/// Lemmatizes a search query, keeping the first occurrence order of each lemma
pub fn query_lemmas(query: &str, lemmatizer: &dyn Lemmatizer) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut lemmas = Vec::new();
    for word in tokenize(query, lemmatizer) {
        let forms = lemmatizer.normalize(&word);
        if forms.discardable {
            continue;
        }
        for base in forms.base_forms {
            if seen.insert(base.clone()) {
                lemmas.push(base);
            }
        }
    }
    lemmas
}

/// Byte ranges of the words in `text` that normalize to one of `lemmas`
pub fn find_lemma_matches(
    text: &str,
    lemmas: &HashSet<String>,
    lemmatizer: &dyn Lemmatizer,
) -> Vec<Range<usize>> {
    let language = lemmatizer.language();
    word_regex()
        .find_iter(text)
        .filter(|m| {
            let word = m.as_str().to_lowercase();
            if !word.chars().all(|c| language.in_alphabet(c)) {
                return false;
            }
            let forms = lemmatizer.normalize(&word);
            !forms.discardable && forms.base_forms.iter().any(|form| lemmas.contains(form))
        })
        .map(|m| m.range())
        .collect()
}
