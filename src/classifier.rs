use crate::{
    batching::batch_frames,
    config::Config,
    error::{ClassifyError, InferenceError},
    formatter::{ClassificationResult, ResultFormatter},
    model_service::ModelService,
    preprocessing::FramePreprocessor,
    validation::FrameValidator,
};

/// Runs the whole pipeline for one request: validate, preprocess every
/// frame, batch, infer and format.
#[derive(Clone)]
pub struct FocusClassifier<M: ModelService> {
    model_service: M,
    validator: FrameValidator,
    preprocessor: FramePreprocessor,
    formatter: ResultFormatter,
}

impl<M: ModelService> FocusClassifier<M> {
    pub fn new(model_service: M, config: &Config) -> Self {
        Self::from_parts(
            model_service,
            FrameValidator::new(config.sequence.length, config.sequence.policy),
            FramePreprocessor::new(
                config.preprocessing.frame_size,
                config.preprocessing.normalization,
            ),
            ResultFormatter::new(config.classifier.softmax),
        )
    }

    pub fn from_parts(
        model_service: M,
        validator: FrameValidator,
        preprocessor: FramePreprocessor,
        formatter: ResultFormatter,
    ) -> Self {
        Self {
            model_service,
            validator,
            preprocessor,
            formatter,
        }
    }

    pub fn model_input_name(&self) -> &str {
        self.model_service.input_name()
    }

    pub fn classify(&self, frames: Vec<String>) -> Result<ClassificationResult, ClassifyError> {
        let frames = self.validator.validate(frames)?;

        let tensors = frames
            .iter()
            .enumerate()
            .map(|(index, frame)| {
                self.preprocessor
                    .preprocess(frame)
                    .map_err(|source| ClassifyError::Decode { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let batch = batch_frames(&tensors)?;
        tracing::debug!(
            input = %self.model_service.input_name(),
            shape = ?batch.shape(),
            "Running inference"
        );

        let scores = self.model_service.run(&batch)?;
        let result = self.formatter.format(&scores)?;

        tracing::debug!(
            level = result.level,
            probabilities = ?result.probabilities,
            "Classified frame sequence"
        );

        Ok(result)
    }

    /// Same as [`FocusClassifier::classify`], on the blocking thread pool.
    pub async fn classify_blocking(
        &self,
        frames: Vec<String>,
    ) -> Result<ClassificationResult, ClassifyError> {
        let classifier = self.clone();
        tokio::task::spawn_blocking(move || classifier.classify(frames))
            .await
            .map_err(|e| InferenceError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{DecodeError, ValidationError},
        formatter::SoftmaxPolicy,
        model_service::tests::MockModelService,
        preprocessing::{tests::encode_data_uri, Normalization},
        validation::FramePolicy,
    };
    use approx::assert_abs_diff_eq;
    use image::{ImageBuffer, Rgb};

    fn classifier(policy: FramePolicy) -> FocusClassifier<MockModelService> {
        FocusClassifier::from_parts(
            MockModelService::default(),
            FrameValidator::new(5, policy),
            FramePreprocessor::new(64, Normalization::IMAGENET),
            ResultFormatter::new(SoftmaxPolicy::Stable),
        )
    }

    fn solid_frames(count: usize, value: u8) -> Vec<String> {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(48, 48, Rgb([value; 3]));
        let frame = encode_data_uri(&img);
        vec![frame; count]
    }

    #[test]
    fn test_classify_returns_distribution() {
        let result = classifier(FramePolicy::Last)
            .classify(solid_frames(5, 255))
            .unwrap();

        assert_eq!(result.level, 2);
        assert_eq!(result.probabilities.len(), 4);
        assert_abs_diff_eq!(result.probabilities.iter().sum::<f32>(), 1.0, epsilon = 1e-4);

        let result = classifier(FramePolicy::Last)
            .classify(solid_frames(5, 0))
            .unwrap();
        assert_eq!(result.level, 0);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = classifier(FramePolicy::Last);
        let first = classifier.classify(solid_frames(5, 77)).unwrap();
        let second = classifier.classify(solid_frames(5, 77)).unwrap();

        assert_eq!(first, second);
        for (a, b) in first.probabilities.iter().zip(second.probabilities.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_classify_requires_five_frames() {
        let err = classifier(FramePolicy::Last)
            .classify(solid_frames(4, 10))
            .unwrap_err();

        assert!(matches!(
            err,
            ClassifyError::Validation(ValidationError::NotEnoughFrames { .. })
        ));
        assert_eq!(err.to_string(), "Need 5 frames");
    }

    #[test]
    fn test_classify_reports_bad_frame_index() {
        let mut frames = solid_frames(5, 10);
        frames[3] = "not a data uri".to_string();

        let err = classifier(FramePolicy::Last).classify(frames).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::Decode {
                index: 3,
                source: DecodeError::MissingSeparator
            }
        ));
    }

    #[test]
    fn test_classify_seven_frames_by_policy() {
        let err = classifier(FramePolicy::PassThrough)
            .classify(solid_frames(7, 10))
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::Inference(InferenceError::Session(_))
        ));

        let result = classifier(FramePolicy::Last)
            .classify(solid_frames(7, 10))
            .unwrap();
        assert_eq!(result.probabilities.len(), 4);
    }

    #[test]
    fn test_last_policy_drops_oldest_frames() {
        let mut frames = vec!["garbage".to_string(), "garbage".to_string()];
        frames.extend(solid_frames(5, 200));

        assert!(classifier(FramePolicy::Last).classify(frames.clone()).is_ok());
        assert!(classifier(FramePolicy::First).classify(frames).is_err());
    }

    #[tokio::test]
    async fn test_classify_blocking() {
        let result = classifier(FramePolicy::Last)
            .classify_blocking(solid_frames(5, 255))
            .await
            .unwrap();

        assert_eq!(result.level, 2);
    }
}
