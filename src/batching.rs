use crate::{error::InferenceError, preprocessing::FrameTensor};
use ndarray::{Array5, ArrayView3, Axis};

pub type BatchTensor = Array5<f32>;

/// Stacks frames along a sequence axis and wraps them in a batch of one,
/// producing `(1, frames, channels, height, width)`.
pub fn batch_frames(frames: &[FrameTensor]) -> Result<BatchTensor, InferenceError> {
    let views: Vec<ArrayView3<f32>> = frames.iter().map(|frame| frame.view()).collect();
    let sequence = ndarray::stack(Axis(0), &views)?;

    Ok(sequence.insert_axis(Axis(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_batch_frames_shape() {
        let frames: Vec<FrameTensor> = (0..5).map(|_| Array3::zeros((3, 64, 64))).collect();
        let batch = batch_frames(&frames).unwrap();

        assert_eq!(batch.shape(), &[1, 5, 3, 64, 64]);
    }

    #[test]
    fn test_batch_frames_preserves_temporal_order() {
        let frames: Vec<FrameTensor> = (0..7)
            .map(|i| Array3::from_elem((3, 4, 4), i as f32))
            .collect();
        let batch = batch_frames(&frames).unwrap();

        assert_eq!(batch.shape(), &[1, 7, 3, 4, 4]);
        for i in 0..7 {
            assert!(batch
                .index_axis(Axis(0), 0)
                .index_axis(Axis(0), i)
                .iter()
                .all(|v| *v == i as f32));
        }
    }

    #[test]
    fn test_batch_frames_rejects_empty_and_ragged_input() {
        assert!(matches!(batch_frames(&[]), Err(InferenceError::Batch(_))));

        let ragged = vec![Array3::zeros((3, 64, 64)), Array3::zeros((3, 32, 32))];
        assert!(matches!(batch_frames(&ragged), Err(InferenceError::Batch(_))));
    }
}
