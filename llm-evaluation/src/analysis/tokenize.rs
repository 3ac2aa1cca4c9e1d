//! Tokenization and stemming shared by the lexical metrics

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::sync::OnceLock;

/// Words (with inner `.` or `-`), apostrophe suffixes and single punctuation marks
static WORD_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Runs of characters that are not lowercase ASCII letters or digits
static NON_ALNUM: OnceLock<Regex> = OnceLock::new();

/// English (Porter family) stemmer
static STEMMER: OnceLock<Stemmer> = OnceLock::new();

fn word_pattern() -> &'static Regex {
    WORD_PATTERN.get_or_init(|| {
        Regex::new(r"\w+(?:[.\-]\w+)*|['’]\w+|[^\w\s]").expect("word pattern is a valid regex")
    })
}

fn non_alnum() -> &'static Regex {
    NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("separator pattern is a valid regex"))
}

fn get_stemmer() -> &'static Stemmer {
    STEMMER.get_or_init(|| Stemmer::create(Algorithm::English))
}

/// Stem a single lowercase word
pub fn stem(word: &str) -> String {
    get_stemmer().stem(word).into_owned()
}

/// Lowercase and split into word and punctuation tokens.
///
/// Punctuation becomes its own token and negative contractions split the
/// way treebank tokenizers do (`don't` -> `do`, `n't`). Numbers, hyphenated
/// compounds and dotted abbreviations stay whole; a trailing `.` is always
/// split off, so `U.S.` becomes `u.s` and `.`.
pub fn word_tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();

    for m in word_pattern().find_iter(&lowered) {
        let token = m.as_str();
        let is_negation = matches!(token, "'t" | "’t");
        if is_negation {
            if let Some(prev) = tokens.last_mut() {
                if prev.len() > 1 && prev.ends_with('n') {
                    prev.pop();
                    tokens.push(format!("n{}", token));
                    continue;
                }
            }
        }
        tokens.push(token.to_string());
    }

    tokens
}

/// Tokenization used by ROUGE: lowercase, keep only `[a-z0-9]` runs, and
/// optionally stem tokens longer than three characters.
pub fn rouge_tokenize(text: &str, use_stemmer: bool) -> Vec<String> {
    let lowered = text.to_lowercase();
    non_alnum()
        .replace_all(&lowered, " ")
        .split_whitespace()
        .map(|t| {
            if use_stemmer && t.len() > 3 {
                stem(t)
            } else {
                t.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokenize_splits_punctuation() {
        assert_eq!(
            word_tokenize("The cat sat on the mat."),
            vec!["the", "cat", "sat", "on", "the", "mat", "."]
        );
    }

    #[test]
    fn test_word_tokenize_contractions() {
        assert_eq!(word_tokenize("Don't stop"), vec!["do", "n't", "stop"]);
        assert_eq!(word_tokenize("It's fine"), vec!["it", "'s", "fine"]);
    }

    #[test]
    fn test_word_tokenize_keeps_inner_dots_and_hyphens() {
        assert_eq!(
            word_tokenize("Pi is 3.14, a state-of-the-art guess."),
            vec!["pi", "is", "3.14", ",", "a", "state-of-the-art", "guess", "."]
        );
        assert_eq!(word_tokenize("The U.S. team"), vec!["the", "u.s", ".", "team"]);
        assert_eq!(word_tokenize("well -- done"), vec!["well", "-", "-", "done"]);
    }

    #[test]
    fn test_word_tokenize_empty() {
        assert!(word_tokenize("   ").is_empty());
    }

    #[test]
    fn test_rouge_tokenize_strips_punctuation_and_stems() {
        let tokens = rouge_tokenize("Running dogs, running!", true);
        assert_eq!(tokens, vec!["run", "dog", "run"]);

        let unstemmed = rouge_tokenize("Running dogs, running!", false);
        assert_eq!(unstemmed, vec!["running", "dogs", "running"]);
    }

    #[test]
    fn test_rouge_tokenize_short_words_unstemmed() {
        assert_eq!(rouge_tokenize("was has", true), vec!["was", "has"]);
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("graphs"), "graph");
        assert_eq!(stem("evaluation"), stem("evaluations"));
    }
}
