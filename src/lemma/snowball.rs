use crate::lemma::{Language, Lemmatizer, WordForms};
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

const RUSSIAN_FUNCTION_WORDS: &[&str] = &[
    // prepositions
    "в", "во", "на", "с", "со", "к", "ко", "по", "о", "об", "обо", "от", "ото", "из", "изо", "у",
    "за", "над", "надо", "под", "подо", "про", "для", "без", "безо", "до", "при", "через", "между",
    "перед", "пред", "около", "вокруг", "после", "среди", "сквозь", "ради", "вместо", "кроме",
    // conjunctions
    "и", "а", "но", "или", "либо", "да", "что", "чтобы", "если", "как", "когда", "пока", "хотя",
    "потому", "поэтому", "зато", "однако", "тоже", "также", "ни", "то", "будто", "словно",
    // particles
    "не", "же", "бы", "б", "ли", "ль", "вот", "вон", "даже", "ведь", "лишь", "только", "уж",
    "разве", "неужели", "пусть", "ну", "де", "мол",
    // interjections
    "ах", "ох", "эх", "ой", "ай", "увы", "ура", "эй", "ого", "ух", "фу", "ага", "ахти", "тсс",
];

const ENGLISH_FUNCTION_WORDS: &[&str] = &[
    // prepositions
    "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "to", "from", "up", "down", "of", "off", "over",
    "under", "upon", "within", "without", "among", "via", "per",
    // conjunctions
    "and", "or", "but", "nor", "so", "yet", "if", "because", "although", "though", "while",
    "whereas", "unless", "than", "whether",
    // articles and particles
    "the", "a", "an", "not", "no",
    // interjections
    "oh", "ah", "wow", "hey", "oops", "alas", "hmm", "ouch", "hooray",
];

/// Lemmatizer backed by the Snowball stemmers
///
/// The stem stands in for the dictionary base form: every inflection of a
/// word maps to the same single form. Function words are recognized from a
/// fixed table and flagged discardable.
pub struct SnowballLemmatizer {
    language: Language,
    stemmer: Stemmer,
    function_words: HashSet<&'static str>,
}

impl SnowballLemmatizer {
    pub fn new(language: Language) -> Self {
        let (algorithm, words) = match language {
            Language::Russian => (Algorithm::Russian, RUSSIAN_FUNCTION_WORDS),
            Language::English => (Algorithm::English, ENGLISH_FUNCTION_WORDS),
        };
        Self {
            language,
            stemmer: Stemmer::create(algorithm),
            function_words: words.iter().copied().collect(),
        }
    }
}

impl Lemmatizer for SnowballLemmatizer {
    fn language(&self) -> Language {
        self.language
    }

    fn normalize(&self, word: &str) -> WordForms {
        if self.function_words.contains(word) {
            return WordForms {
                base_forms: Vec::new(),
                discardable: true,
            };
        }

        let stem = self.stemmer.stem(word);
        let base_forms = if stem.is_empty() {
            Vec::new()
        } else {
            vec![stem.into_owned()]
        };
        WordForms {
            base_forms,
            discardable: false,
        }
    }
}
