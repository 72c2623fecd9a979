use crate::error::ValidationError;
use serde::Deserialize;

/// What to do with frames beyond the model's sequence length.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FramePolicy {
    /// Batch every frame and let the model reject the shape.
    PassThrough,
    Exact,
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, Copy)]
pub struct FrameValidator {
    sequence_length: usize,
    policy: FramePolicy,
}

impl FrameValidator {
    pub fn new(sequence_length: usize, policy: FramePolicy) -> Self {
        Self {
            sequence_length,
            policy,
        }
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn validate(&self, mut frames: Vec<String>) -> Result<Vec<String>, ValidationError> {
        let required = self.sequence_length;
        let received = frames.len();

        if received < required {
            return Err(ValidationError::NotEnoughFrames { required, received });
        }

        match self.policy {
            FramePolicy::PassThrough => {}
            FramePolicy::Exact if received > required => {
                return Err(ValidationError::TooManyFrames { required, received });
            }
            FramePolicy::Exact => {}
            FramePolicy::First => frames.truncate(required),
            FramePolicy::Last => {
                frames.drain(..received - required);
            }
        }

        Ok(frames)
    }
}
