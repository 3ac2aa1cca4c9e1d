//! METEOR: unigram alignment with a fragmentation penalty

use serde::{Deserialize, Serialize};

use super::tokenize::{stem, word_tokenize};

/// Weight of precision against recall in the harmonic mean
const ALPHA: f64 = 0.9;
/// Shape of the fragmentation penalty
const BETA: f64 = 3.0;
/// Maximum fragmentation penalty
const GAMMA: f64 = 0.5;

/// METEOR score for one reference/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteorScore {
    pub score: f64,
    pub reference_tokens: Vec<String>,
    pub response_tokens: Vec<String>,
}

/// Tokenize both texts and compute METEOR.
pub fn calculate_meteor(reference: &str, response: &str) -> MeteorScore {
    let reference_tokens = word_tokenize(reference);
    let response_tokens = word_tokenize(response);
    let score = single_meteor(&reference_tokens, &response_tokens);

    MeteorScore {
        score,
        reference_tokens,
        response_tokens,
    }
}

/// METEOR over pre-tokenized, lowercased text.
pub fn single_meteor(reference: &[String], hypothesis: &[String]) -> f64 {
    let matches = align(reference, hypothesis);
    if matches.is_empty() {
        return 0.0;
    }

    let matched = matches.len() as f64;
    let precision = matched / hypothesis.len() as f64;
    let recall = matched / reference.len() as f64;
    let fmean = precision * recall / (ALPHA * precision + (1.0 - ALPHA) * recall);

    let fragmentation = count_chunks(&matches) as f64 / matched;
    let penalty = GAMMA * fragmentation.powf(BETA);

    (1.0 - penalty) * fmean
}

/// Align hypothesis to reference words: exact matches first, then stem
/// matches among the leftovers. Returns `(hyp_index, ref_index)` pairs
/// sorted by hypothesis position.
fn align(reference: &[String], hypothesis: &[String]) -> Vec<(usize, usize)> {
    let mut hyp: Vec<(usize, String)> = hypothesis.iter().cloned().enumerate().collect();
    let mut refs: Vec<(usize, String)> = reference.iter().cloned().enumerate().collect();

    let mut matches = match_stage(&mut hyp, &mut refs);

    let mut hyp_stems: Vec<(usize, String)> = hyp.iter().map(|(i, w)| (*i, stem(w))).collect();
    let mut ref_stems: Vec<(usize, String)> = refs.iter().map(|(i, w)| (*i, stem(w))).collect();
    matches.extend(match_stage(&mut hyp_stems, &mut ref_stems));

    matches.sort_unstable();
    matches
}

/// Greedy matching from the end of both sequences; matched words are
/// removed so later stages only see what is left.
fn match_stage(
    hyp: &mut Vec<(usize, String)>,
    refs: &mut Vec<(usize, String)>,
) -> Vec<(usize, usize)> {
    let mut matches = Vec::new();

    for i in (0..hyp.len()).rev() {
        if let Some(j) = (0..refs.len()).rev().find(|&j| refs[j].1 == hyp[i].1) {
            matches.push((hyp[i].0, refs[j].0));
            hyp.remove(i);
            refs.remove(j);
        }
    }

    matches
}

/// Number of runs of matches that are contiguous in both sequences
fn count_chunks(matches: &[(usize, usize)]) -> usize {
    if matches.is_empty() {
        return 0;
    }
    1 + matches
        .windows(2)
        .filter(|w| !(w[1].0 == w[0].0 + 1 && w[1].1 == w[0].1 + 1))
        .count()
}
