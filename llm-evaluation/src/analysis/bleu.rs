//! Sentence-level BLEU with additive-epsilon smoothing

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::tokenize::word_tokenize;

/// Highest n-gram order, weighted uniformly
const MAX_N: usize = 4;

/// Numerator substituted for n-gram orders with no matches
const SMOOTHING_EPSILON: f64 = 0.1;

/// BLEU score for one reference/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BleuScore {
    pub score: f64,
    pub reference_tokens: Vec<String>,
    pub response_tokens: Vec<String>,
}

/// Tokenize both texts and compute smoothed sentence BLEU.
pub fn calculate_bleu(reference: &str, response: &str) -> BleuScore {
    let reference_tokens = word_tokenize(reference);
    let response_tokens = word_tokenize(response);
    let score = sentence_bleu(std::slice::from_ref(&reference_tokens), &response_tokens);

    BleuScore {
        score,
        reference_tokens,
        response_tokens,
    }
}

/// Sentence BLEU over pre-tokenized text.
///
/// Orders with zero matches contribute `epsilon / total` instead of zero,
/// so short responses do not collapse to 0. A response with no unigram
/// match at all still scores 0.
pub fn sentence_bleu(references: &[Vec<String>], hypothesis: &[String]) -> f64 {
    let hyp_len = hypothesis.len();
    if references.is_empty() || hyp_len == 0 {
        return 0.0;
    }

    let mut log_sum = 0.0;
    for n in 1..=MAX_N {
        let (clipped, total) = modified_precision(references, hypothesis, n);
        if n == 1 && clipped == 0 {
            return 0.0;
        }
        let denominator = total.max(1) as f64;
        let precision = if clipped == 0 {
            SMOOTHING_EPSILON / denominator
        } else {
            clipped as f64 / denominator
        };
        log_sum += precision.ln() / MAX_N as f64;
    }

    brevity_penalty(references, hyp_len) * log_sum.exp()
}

/// Brevity penalty against the reference closest in length
fn brevity_penalty(references: &[Vec<String>], hyp_len: usize) -> f64 {
    let closest_ref_len = references
        .iter()
        .map(Vec::len)
        .min_by_key(|&len| ((len as isize - hyp_len as isize).unsigned_abs(), len))
        .unwrap_or(0);

    if hyp_len > closest_ref_len {
        1.0
    } else if hyp_len == 0 {
        0.0
    } else {
        (1.0 - closest_ref_len as f64 / hyp_len as f64).exp()
    }
}

/// Modified n-gram precision: count clipped matches against all references.
fn modified_precision(references: &[Vec<String>], hypothesis: &[String], n: usize) -> (usize, usize) {
    let hyp_ngrams = ngram_counts(hypothesis, n);
    let total: usize = hyp_ngrams.values().sum();

    let ref_ngrams: Vec<HashMap<&[String], usize>> =
        references.iter().map(|r| ngram_counts(r, n)).collect();

    let clipped = hyp_ngrams
        .iter()
        .map(|(ngram, &count)| {
            let max_ref = ref_ngrams
                .iter()
                .map(|r| r.get(ngram).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            count.min(max_ref)
        })
        .sum();

    (clipped, total)
}

/// Count n-gram occurrences in a token sequence.
pub(crate) fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if n > 0 && tokens.len() >= n {
        for window in tokens.windows(n) {
            *counts.entry(window).or_insert(0) += 1;
        }
    }
    counts
}
