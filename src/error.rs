use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Frame is missing the data URI separator")]
    MissingSeparator,
    #[error("Failed to decode base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Decoded image is empty")]
    EmptyImage,
    #[error("Failed to read image bytes: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Failed to assemble batch: {0}")]
    Batch(#[from] ndarray::ShapeError),
    #[error("Failed to build tensor: {0}")]
    Tensor(String),
    #[error("Inference failed: {0}")]
    Session(String),
    #[error("Session mutex poisoned: {0}")]
    Poisoned(String),
    #[error("Failed to extract output tensor: {0}")]
    Output(String),
    #[error("Model returned an empty score vector")]
    EmptyScores,
    #[error("Inference task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Need {required} frames")]
    NotEnoughFrames { required: usize, received: usize },
    #[error("Need exactly {required} frames, received {received}")]
    TooManyFrames { required: usize, received: usize },
}

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Frame {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: DecodeError,
    },
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl ClassifyError {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::Validation(_) => "validation",
            ClassifyError::Decode { .. } => "decode",
            ClassifyError::Inference(_) => "inference",
        }
    }
}
