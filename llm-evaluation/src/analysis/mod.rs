//! Lexical-overlap metrics
//!
//! Each calculator maps `(reference, response)` to a score in `[0, 1]` plus
//! the intermediate data worth reporting. All of them are pure and
//! deterministic; text that tokenizes to nothing scores 0.

pub mod bleu;
pub mod meteor;
pub mod rouge;
pub mod tokenize;

pub use bleu::{calculate_bleu, sentence_bleu, BleuScore};
pub use meteor::{calculate_meteor, single_meteor, MeteorScore};
pub use rouge::{calculate_rouge, RougeScore, RougeScores};
pub use tokenize::{rouge_tokenize, word_tokenize};
