use crate::error::DecodeError;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::imageops::FilterType;
use ndarray::Array3;
use serde::Deserialize;
use std::io::Cursor;

pub type FrameTensor = Array3<f32>;

pub const CHANNELS: usize = 3;

/// Per-channel statistics the model was trained with, applied as
/// `(pixel / 255 - mean[c]) / std[c]`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mean: [f32; CHANNELS],
    pub std: [f32; CHANNELS],
}

impl Normalization {
    pub const IMAGENET: Normalization = Normalization {
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };

    pub fn apply(&self, channel: usize, value: u8) -> f32 {
        ((value as f32) / 255. - self.mean[channel]) / self.std[channel]
    }

    /// Smallest and largest value a normalized channel can take.
    pub fn bounds(&self, channel: usize) -> (f32, f32) {
        (self.apply(channel, 0), self.apply(channel, u8::MAX))
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Self::IMAGENET
    }
}

#[derive(Debug, Clone)]
pub struct FramePreprocessor {
    frame_size: u32,
    normalization: Normalization,
}

impl FramePreprocessor {
    pub fn new(frame_size: u32, normalization: Normalization) -> Self {
        Self {
            frame_size,
            normalization,
        }
    }

    pub fn frame_size(&self) -> u32 {
        self.frame_size
    }

    pub fn preprocess(&self, raw_frame: &str) -> Result<FrameTensor, DecodeError> {
        let payload = strip_data_uri(raw_frame)?;
        let image_data = STANDARD.decode(payload)?;

        let original_img = image::ImageReader::new(Cursor::new(image_data))
            .with_guessed_format()?
            .decode()?;

        if original_img.width() == 0 || original_img.height() == 0 {
            return Err(DecodeError::EmptyImage);
        }

        let img = image::imageops::resize(
            &original_img.to_rgb8(),
            self.frame_size,
            self.frame_size,
            FilterType::CatmullRom,
        );

        let size = self.frame_size as usize;
        let mut input = Array3::zeros((CHANNELS, size, size));
        for (x, y, pixel) in img.enumerate_pixels() {
            let x = x as usize;
            let y = y as usize;
            for (channel, value) in pixel.0.into_iter().enumerate() {
                input[[channel, y, x]] = self.normalization.apply(channel, value);
            }
        }

        Ok(input)
    }
}

/// Returns the payload following the first comma of a data URI.
fn strip_data_uri(raw_frame: &str) -> Result<&str, DecodeError> {
    raw_frame
        .split_once(',')
        .map(|(_, payload)| payload)
        .ok_or(DecodeError::MissingSeparator)
}
