//! ROUGE-1, ROUGE-2 and ROUGE-L with stemming

use serde::{Deserialize, Serialize};

use super::bleu::ngram_counts;
use super::tokenize::rouge_tokenize;

/// Precision, recall and F-measure at one granularity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

impl RougeScore {
    fn from_counts(overlap: usize, response_total: usize, reference_total: usize) -> Self {
        let precision = overlap as f64 / response_total.max(1) as f64;
        let recall = overlap as f64 / reference_total.max(1) as f64;
        Self {
            precision,
            recall,
            fmeasure: f_measure(precision, recall),
        }
    }
}

/// All three ROUGE granularities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RougeScores {
    pub rouge1: RougeScore,
    pub rouge2: RougeScore,
    #[serde(rename = "rougeL")]
    pub rouge_l: RougeScore,
}

fn f_measure(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// Score a response against a reference; the headline number is `rouge_l.fmeasure`.
pub fn calculate_rouge(reference: &str, response: &str) -> RougeScores {
    let reference_tokens = rouge_tokenize(reference, true);
    let response_tokens = rouge_tokenize(response, true);

    RougeScores {
        rouge1: rouge_n(&reference_tokens, &response_tokens, 1),
        rouge2: rouge_n(&reference_tokens, &response_tokens, 2),
        rouge_l: rouge_l(&reference_tokens, &response_tokens),
    }
}

/// N-gram overlap score.
pub fn rouge_n(reference: &[String], response: &[String], n: usize) -> RougeScore {
    let ref_ngrams = ngram_counts(reference, n);
    let hyp_ngrams = ngram_counts(response, n);

    let overlap: usize = hyp_ngrams
        .iter()
        .map(|(ngram, &count)| count.min(ref_ngrams.get(ngram).copied().unwrap_or(0)))
        .sum();

    RougeScore::from_counts(
        overlap,
        hyp_ngrams.values().sum(),
        ref_ngrams.values().sum(),
    )
}

/// Longest-common-subsequence score.
pub fn rouge_l(reference: &[String], response: &[String]) -> RougeScore {
    if reference.is_empty() || response.is_empty() {
        return RougeScore::default();
    }

    let lcs = lcs_length(reference, response);
    RougeScore::from_counts(lcs, response.len(), reference.len())
}

/// Compute length of longest common subsequence.
fn lcs_length(a: &[String], b: &[String]) -> usize {
    let m = b.len();
    // Two rolling rows of the classic DP table
    let mut prev = vec![0usize; m + 1];
    let mut curr = vec![0usize; m + 1];

    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m]
}
