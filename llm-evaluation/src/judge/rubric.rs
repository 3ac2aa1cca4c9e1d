//! Judge weight table

use serde::{Deserialize, Serialize};

use super::types::Attribute;

/// Share of the total weight given to context adherence when context is present
pub const CONTEXT_ADHERENCE_WEIGHT: f64 = 0.1;

/// A single weighted attribute
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityCriterion {
    pub attribute: Attribute,
    pub weight: f64,
}

/// Weights applied to attribute scores to form the overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRubric {
    pub criteria: Vec<QualityCriterion>,
}

/// Score for a single criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub attribute: Attribute,
    pub score: f64,
    pub weight: f64,
    pub weighted_score: f64,
}

/// Score from a rubric evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricScore {
    pub composite_score: f64,
    pub criterion_scores: Vec<CriterionScore>,
}

impl ScoringRubric {
    /// Weights used when no context is supplied
    pub fn base() -> Self {
        let criteria = [
            (Attribute::Accuracy, 0.25),
            (Attribute::Relevance, 0.15),
            (Attribute::Coherence, 0.15),
            (Attribute::EthicalConsiderations, 0.10),
            (Attribute::Professionalism, 0.10),
            (Attribute::Reasoning, 0.15),
            (Attribute::Creativity, 0.10),
        ]
        .into_iter()
        .map(|(attribute, weight)| QualityCriterion { attribute, weight })
        .collect();

        Self { criteria }
    }

    /// Base weights scaled down to make room for context adherence
    pub fn with_context() -> Self {
        let scale = 1.0 - CONTEXT_ADHERENCE_WEIGHT;
        let mut criteria: Vec<QualityCriterion> = Self::base()
            .criteria
            .into_iter()
            .map(|c| QualityCriterion {
                weight: c.weight * scale,
                ..c
            })
            .collect();
        criteria.push(QualityCriterion {
            attribute: Attribute::ContextAdherence,
            weight: CONTEXT_ADHERENCE_WEIGHT,
        });

        Self { criteria }
    }

    pub fn for_context(has_context: bool) -> Self {
        if has_context {
            Self::with_context()
        } else {
            Self::base()
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.criteria.iter().map(|c| c.weight).sum()
    }

    pub fn weight_of(&self, attribute: Attribute) -> Option<f64> {
        self.criteria
            .iter()
            .find(|c| c.attribute == attribute)
            .map(|c| c.weight)
    }

    /// Weighted sum of attribute scores.
    ///
    /// Scores are used as given; a criterion with no score contributes 0.
    pub fn evaluate(&self, scores: &[(Attribute, f64)]) -> RubricScore {
        let criterion_scores: Vec<CriterionScore> = self
            .criteria
            .iter()
            .map(|c| {
                let score = scores
                    .iter()
                    .find(|(attr, _)| *attr == c.attribute)
                    .map(|(_, s)| *s)
                    .unwrap_or(0.0);
                CriterionScore {
                    attribute: c.attribute,
                    score,
                    weight: c.weight,
                    weighted_score: score * c.weight,
                }
            })
            .collect();

        RubricScore {
            composite_score: criterion_scores.iter().map(|c| c.weighted_score).sum(),
            criterion_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        assert!((ScoringRubric::base().total_weight() - 1.0).abs() < 1e-9);
        assert!((ScoringRubric::with_context().total_weight() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_context_scaling() {
        let rubric = ScoringRubric::with_context();
        assert_eq!(rubric.criteria.len(), 8);
        assert!((rubric.weight_of(Attribute::Accuracy).unwrap() - 0.225).abs() < 1e-12);
        assert!((rubric.weight_of(Attribute::Creativity).unwrap() - 0.09).abs() < 1e-12);
        assert_eq!(rubric.weight_of(Attribute::ContextAdherence), Some(0.1));
        assert_eq!(ScoringRubric::base().weight_of(Attribute::ContextAdherence), None);
    }

    #[test]
    fn test_uniform_scores_give_same_overall() {
        let scores: Vec<(Attribute, f64)> = Attribute::BASE.iter().map(|&a| (a, 0.8)).collect();
        let result = ScoringRubric::base().evaluate(&scores);
        assert!((result.composite_score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_sum() {
        let mut scores: Vec<(Attribute, f64)> = Attribute::BASE.iter().map(|&a| (a, 0.0)).collect();
        scores[0].1 = 1.0; // accuracy
        let result = ScoringRubric::base().evaluate(&scores);
        assert!((result.composite_score - 0.25).abs() < 1e-12);
        assert_eq!(result.criterion_scores.len(), 7);
    }

    #[test]
    fn test_out_of_range_scores_pass_through() {
        let scores: Vec<(Attribute, f64)> = Attribute::BASE.iter().map(|&a| (a, 2.0)).collect();
        let result = ScoringRubric::base().evaluate(&scores);
        assert!((result.composite_score - 2.0).abs() < 1e-9);
    }
}
