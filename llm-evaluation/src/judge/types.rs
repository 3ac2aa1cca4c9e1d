//! Judge result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One scored dimension of the judge rubric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Accuracy,
    Relevance,
    Coherence,
    EthicalConsiderations,
    Professionalism,
    Reasoning,
    Creativity,
    ContextAdherence,
}

impl Attribute {
    /// Attributes judged for every response, in request order
    pub const BASE: [Attribute; 7] = [
        Attribute::Accuracy,
        Attribute::Relevance,
        Attribute::Coherence,
        Attribute::EthicalConsiderations,
        Attribute::Professionalism,
        Attribute::Reasoning,
        Attribute::Creativity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Accuracy => "accuracy",
            Attribute::Relevance => "relevance",
            Attribute::Coherence => "coherence",
            Attribute::EthicalConsiderations => "ethical_considerations",
            Attribute::Professionalism => "professionalism",
            Attribute::Reasoning => "reasoning",
            Attribute::Creativity => "creativity",
            Attribute::ContextAdherence => "context_adherence",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score and rationale returned by one judge request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeScore {
    pub score: f64,
    pub explanation: String,
}

/// Full judgment of one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub accuracy: AttributeScore,
    pub relevance: AttributeScore,
    pub coherence: AttributeScore,
    pub ethical_considerations: AttributeScore,
    pub professionalism: AttributeScore,
    pub reasoning: AttributeScore,
    pub creativity: AttributeScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_adherence: Option<AttributeScore>,
    pub overall_score: f64,
}

impl EvaluationResult {
    /// Judged attributes in rubric order, context adherence last when present
    pub fn attributes(&self) -> Vec<(Attribute, &AttributeScore)> {
        let mut attrs = vec![
            (Attribute::Accuracy, &self.accuracy),
            (Attribute::Relevance, &self.relevance),
            (Attribute::Coherence, &self.coherence),
            (Attribute::EthicalConsiderations, &self.ethical_considerations),
            (Attribute::Professionalism, &self.professionalism),
            (Attribute::Reasoning, &self.reasoning),
            (Attribute::Creativity, &self.creativity),
        ];
        if let Some(context) = &self.context_adherence {
            attrs.push((Attribute::ContextAdherence, context));
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_match_serde() {
        for attr in Attribute::BASE.iter().chain([Attribute::ContextAdherence].iter()) {
            let json = serde_json::to_value(attr).unwrap();
            assert_eq!(json, attr.as_str());
        }
    }

    #[test]
    fn test_attribute_score_rejects_unknown_fields() {
        let ok: AttributeScore =
            serde_json::from_str(r#"{"score": 0.8, "explanation": "fine"}"#).unwrap();
        assert_eq!(ok.score, 0.8);

        assert!(serde_json::from_str::<AttributeScore>(
            r#"{"score": 0.8, "explanation": "fine", "extra": 1}"#
        )
        .is_err());
        assert!(serde_json::from_str::<AttributeScore>(r#"{"score": "high"}"#).is_err());
    }
}
