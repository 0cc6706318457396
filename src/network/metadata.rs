use serde::{Deserialize, Serialize};

use crate::vision::normalize::TensorShape;

/// Describes how to interpret the input fed to a Network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputType {
    /// Plain feature vector.
    Numeric,
    /// Grayscale image resized to width×height, normalized to [0, 1].
    ImageGrayscale { width: u32, height: u32 },
    /// RGB image resized to width×height, normalized to [0, 1], flattened as R,G,B,...
    ImageRgb { width: u32, height: u32 },
}

impl InputType {
    /// Tensor shape implied by an image input type; `None` for `Numeric`.
    pub fn tensor_shape(&self) -> Option<TensorShape> {
        match *self {
            InputType::Numeric => None,
            InputType::ImageGrayscale { width, height } => Some(TensorShape::new(height, width, 1)),
            InputType::ImageRgb { width, height } => Some(TensorShape::new(height, width, 3)),
        }
    }
}

/// Optional annotations attached to a saved Network.
/// All fields are Option<> so models without metadata deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    pub input_type: Option<InputType>,
    /// Human-readable class labels for the output layer (e.g. ["0","1",...,"9"]).
    pub output_labels: Option<Vec<String>>,
}
