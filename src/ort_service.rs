use crate::{
    batching::BatchTensor,
    config::{ModelConfig, Validatable},
    error::InferenceError,
    model_service::{ModelService, ScoreVector},
};
use ndarray::{ArrayD, Axis};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

#[derive(Clone)]
pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
    input_name: Arc<str>,
    output_name: Arc<str>,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, Box<dyn std::error::Error>> {
        model_config.validate()?;
        init_runtime()?;

        let num_instances = model_config.num_instances.max(1);
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(model_config.get_path())?;
                Ok(session)
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        let (input_name, output_name) = resolve_io_names(&sessions[0])?;

        tracing::info!(
            input = %input_name,
            output = %output_name,
            "Created {} ONNX sessions from {:?}",
            num_instances,
            model_config.get_path()
        );

        Ok(Self {
            sessions: Arc::new(
                sessions
                    .into_iter()
                    .map(|session| Arc::new(Mutex::new(session)))
                    .collect(),
            ),
            counter: Arc::new(AtomicUsize::new(0)),
            input_name: input_name.into(),
            output_name: output_name.into(),
        })
    }

    pub fn run_inference(&self, input: &BatchTensor) -> Result<ArrayD<f32>, InferenceError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let mut session = self.sessions[index]
            .lock()
            .map_err(|e| InferenceError::Poisoned(e.to_string()))?;

        tracing::debug!("Handling request with session {}", index);
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().into_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| InferenceError::Tensor(e.to_string()))?;

        let outputs = session
            .run(ort::inputs![&*self.input_name => tensor_ref])
            .map_err(|e| InferenceError::Session(e.to_string()))?;

        let (shape, data) = outputs[&*self.output_name]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Output(e.to_string()))?;

        let array = ArrayD::from_shape_vec(shape.to_ixdyn(), data.to_vec())
            .map_err(|e| InferenceError::Output(format!("invalid tensor shape: {}", e)))?;

        Ok(array)
    }
}

impl ModelService for OrtModelService {
    fn input_name(&self) -> &str {
        &self.input_name
    }

    fn run(&self, input: &BatchTensor) -> Result<ScoreVector, InferenceError> {
        let outputs = self.run_inference(input)?;
        first_sample_scores(outputs)
    }
}

#[cfg(feature = "tensorrt")]
fn init_runtime() -> Result<(), ort::Error> {
    use ort::execution_providers::TensorRTExecutionProvider;

    ort::init()
        .with_execution_providers([TensorRTExecutionProvider::default()
            .with_engine_cache(true)
            .build()])
        .commit()?;
    Ok(())
}

#[cfg(not(feature = "tensorrt"))]
fn init_runtime() -> Result<(), ort::Error> {
    ort::init().commit()?;
    Ok(())
}

fn resolve_io_names(session: &Session) -> Result<(String, String), InferenceError> {
    let input = session
        .inputs
        .first()
        .ok_or_else(|| InferenceError::Session("model declares no inputs".into()))?;
    let output = session
        .outputs
        .first()
        .ok_or_else(|| InferenceError::Session("model declares no outputs".into()))?;

    Ok((input.name.clone(), output.name.clone()))
}

/// Scores of the single sample in the batch, i.e. `output[0]`.
fn first_sample_scores(outputs: ArrayD<f32>) -> Result<ScoreVector, InferenceError> {
    let scores: ScoreVector = match outputs.ndim() {
        0 => return Err(InferenceError::Output("model returned a scalar".into())),
        1 => outputs.iter().copied().collect(),
        _ => {
            if outputs.len_of(Axis(0)) == 0 {
                return Err(InferenceError::EmptyScores);
            }
            outputs.index_axis(Axis(0), 0).iter().copied().collect()
        }
    };

    if scores.is_empty() {
        return Err(InferenceError::EmptyScores);
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, IxDyn};

    #[test]
    fn test_first_sample_scores() {
        let outputs = arr2(&[[0.1_f32, 2.0, -1.0, 0.5]]).into_dyn();
        assert_eq!(
            first_sample_scores(outputs).unwrap(),
            vec![0.1, 2.0, -1.0, 0.5]
        );

        let outputs = arr1(&[3.0_f32, 1.0]).into_dyn();
        assert_eq!(first_sample_scores(outputs).unwrap(), vec![3.0, 1.0]);
    }

    #[test]
    fn test_first_sample_scores_rejects_empty_output() {
        let outputs = ArrayD::<f32>::zeros(IxDyn(&[1, 0]));
        assert!(matches!(
            first_sample_scores(outputs),
            Err(InferenceError::EmptyScores)
        ));

        let outputs = ArrayD::<f32>::zeros(IxDyn(&[0, 4]));
        assert!(matches!(
            first_sample_scores(outputs),
            Err(InferenceError::EmptyScores)
        ));
    }

    #[test]
    fn test_new_fails_for_missing_model() {
        let model_config = ModelConfig {
            onnx_file: "missing.onnx".to_string(),
            model_dir: std::path::PathBuf::from("./does_not_exist"),
            num_instances: 1,
        };

        assert!(OrtModelService::new(&model_config).is_err());
    }
}
