use crate::{batching::BatchTensor, error::InferenceError};

pub type ScoreVector = Vec<f32>;

pub trait ModelService: Send + Sync + Clone + 'static {
    fn input_name(&self) -> &str;
    fn run(&self, input: &BatchTensor) -> Result<ScoreVector, InferenceError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Stands in for the focus model: accepts a single shape and scores
    /// frames by their mean normalized intensity.
    #[derive(Clone)]
    pub(crate) struct MockModelService {
        pub expected_shape: [usize; 5],
    }

    impl Default for MockModelService {
        fn default() -> Self {
            Self {
                expected_shape: [1, 5, 3, 64, 64],
            }
        }
    }

    impl ModelService for MockModelService {
        fn input_name(&self) -> &str {
            "frames"
        }

        fn run(&self, input: &BatchTensor) -> Result<ScoreVector, InferenceError> {
            if input.shape() != &self.expected_shape[..] {
                return Err(InferenceError::Session(format!(
                    "Got invalid dimensions for input: {}, expected {:?}, got {:?}",
                    self.input_name(),
                    self.expected_shape,
                    input.shape()
                )));
            }

            let mean = input.mean().unwrap_or(0.);
            Ok(vec![-mean, 0.5, mean, 0.25])
        }
    }
}
