//! Rubric instructions sent as the system prompt of each judge request

use super::types::Attribute;

const ACCURACY: &str = "You are an expert evaluator focusing solely on accuracy. Assess how closely the response matches the expected answer:

Scoring criteria:
- 0.9-1.0: Perfect match with no errors
- 0.7-0.89: Largely correct with minor errors
- 0.5-0.69: Some correct info but significant errors
- 0.25-0.49: Limited understanding, mostly incorrect
- 0-0.24: Entirely incorrect

Provide the score and a detailed explanation for your assessment.";

const RELEVANCE: &str = "You are an expert evaluator focusing solely on relevance. Assess how directly the response addresses the question.

Scoring criteria:
- 0.9-1.0: Perfectly addresses the core question
- 0.7-0.89: Mostly relevant with minor tangents
- 0.5-0.69: Partially relevant with significant deviation
- 0.25-0.49: Mostly irrelevant but touches on topic
- 0-0.24: Completely off-topic

Provide the score and a detailed explanation for your assessment.";

const COHERENCE: &str = "You are an expert evaluator focusing solely on coherence. Assess how logically structured and consistent the response is.

Scoring criteria:
- 0.9-1.0: Perfect logical flow and consistency
- 0.7-0.89: Generally well-structured with minor issues
- 0.5-0.69: Somewhat organized but with clarity issues
- 0.25-0.49: Poorly structured with significant confusion
- 0-0.24: Completely incoherent

Provide the score and a detailed explanation for your assessment.";

const CONTEXT_ADHERENCE: &str = "You are an expert evaluator focusing solely on context adherence. Assess how well the response aligns with and remains faithful to the given context:

Scoring criteria:
- 0.9-1.0: Perfect alignment with context, uses relevant information appropriately
- 0.7-0.89: Strong context alignment with minor deviations
- 0.5-0.69: Moderate context usage with some irrelevant or missing elements
- 0.25-0.49: Poor context adherence, misses key information
- 0-0.24: Completely ignores or misuses context

Provide the score and a detailed explanation for your assessment.";

const ETHICAL: &str = "You are an expert evaluator focusing solely on ethical considerations. Assess how well the content adheres to moral principles:

Scoring criteria:
- 0.9-1.0: Exemplary ethical awareness and consideration
- 0.7-0.89: Strong ethical foundation with minor oversights
- 0.5-0.69: Basic ethical compliance with room for improvement
- 0.25-0.49: Significant ethical concerns present
- 0-0.24: Serious ethical violations or harmful content

Provide the score and a detailed explanation for your assessment.";

const PROFESSIONALISM: &str = "You are an expert evaluator focusing solely on professionalism. Assess how well the content meets professional standards:

Scoring criteria:
- 0.9-1.0: Exceptional professionalism and formal communication
- 0.7-0.89: Professional with minor informal elements
- 0.5-0.69: Generally professional but with notable lapses
- 0.25-0.49: Significantly unprofessional elements
- 0-0.24: Completely unprofessional or inappropriate

Provide the score and a detailed explanation for your assessment.";

const REASONING: &str = "You are an expert evaluator focusing solely on reasoning quality. Assess how well the response supports its conclusions:

Scoring criteria:
- 0.9-1.0: Exceptional logical flow and well-supported conclusions
- 0.7-0.89: Strong reasoning with minor logical gaps
- 0.5-0.69: Basic reasoning present but needs stronger support
- 0.25-0.49: Weak or flawed reasoning
- 0-0.24: No clear reasoning or completely illogical

Provide the score and a detailed explanation for your assessment.";

const CREATIVITY: &str = "You are an expert evaluator focusing solely on creativity and originality. Assess how well the content presents novel ideas:

Scoring criteria:
- 0.9-1.0: Highly innovative and original perspective
- 0.7-0.89: Creative approach with some unique elements
- 0.5-0.69: Standard approach with occasional creative elements
- 0.25-0.49: Mostly conventional with little originality
- 0-0.24: Completely conventional or derivative

Provide the score and a detailed explanation for your assessment.";

/// System instruction for one attribute
pub fn rubric_for(attribute: Attribute) -> &'static str {
    match attribute {
        Attribute::Accuracy => ACCURACY,
        Attribute::Relevance => RELEVANCE,
        Attribute::Coherence => COHERENCE,
        Attribute::EthicalConsiderations => ETHICAL,
        Attribute::Professionalism => PROFESSIONALISM,
        Attribute::Reasoning => REASONING,
        Attribute::Creativity => CREATIVITY,
        Attribute::ContextAdherence => CONTEXT_ADHERENCE,
    }
}

/// User payload shared by every attribute request. The context block is
/// only included for the context-adherence request.
pub fn build_user_prompt(
    question: &str,
    response: &str,
    reference: &str,
    context: Option<&str>,
) -> String {
    let context_block = context
        .map(|c| format!("Context: {}\n", c))
        .unwrap_or_default();

    format!(
        "{}Question: {}\nResponse to evaluate: {}\nCorrect Reference answer: {}\n\nEvaluate the response based on the given criteria.",
        context_block, question, response, reference
    )
}
