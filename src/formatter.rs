use crate::error::InferenceError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub level: usize,
    pub probabilities: Vec<f32>,
}

/// How scores are exponentiated before normalization.
///
/// `Literal` exponentiates raw scores and overflows to `NaN` once a logit
/// exceeds roughly 88. `Stable` shifts every score by the maximum first,
/// which yields the same distribution for well-behaved logits.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SoftmaxPolicy {
    #[default]
    Stable,
    Literal,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFormatter {
    policy: SoftmaxPolicy,
}

impl ResultFormatter {
    pub fn new(policy: SoftmaxPolicy) -> Self {
        Self { policy }
    }

    pub fn format(&self, scores: &[f32]) -> Result<ClassificationResult, InferenceError> {
        let level = argmax(scores).ok_or(InferenceError::EmptyScores)?;
        let probabilities = softmax(scores, self.policy);

        Ok(ClassificationResult {
            level,
            probabilities,
        })
    }
}

/// Index of the largest score, the first one on ties.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .reduce(|accum, row| if row.1 > accum.1 { row } else { accum })
        .map(|(index, _)| index)
}

pub fn softmax(scores: &[f32], policy: SoftmaxPolicy) -> Vec<f32> {
    let shift = match policy {
        SoftmaxPolicy::Stable => scores.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        SoftmaxPolicy::Literal => 0.,
    };

    let exps: Vec<f32> = scores.iter().map(|score| (score - shift).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|value| value / sum).collect()
}
