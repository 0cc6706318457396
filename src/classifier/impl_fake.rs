//! Deterministic stand-ins for a trained model, used by tests and demos.

use crate::classifier::interface::{DigitClassifier, DIGIT_LABELS};
use crate::error::ClassifierError;
use crate::vision::normalize::{NormalizedTensor, TensorShape};

fn one_hot(index: usize) -> Vec<f64> {
    let mut v = vec![0.0; DIGIT_LABELS.len()];
    v[index] = 1.0;
    v
}

/// Answers the same digit for every tensor.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    shape: TensorShape,
    digit: usize,
}

impl FixedClassifier {
    pub fn new(shape: TensorShape, digit: usize) -> Self {
        FixedClassifier { shape, digit: digit.min(DIGIT_LABELS.len() - 1) }
    }
}

impl DigitClassifier for FixedClassifier {
    fn input_shape(&self) -> TensorShape {
        self.shape
    }

    fn probabilities(&self, _tensor: &NormalizedTensor) -> Result<Vec<f64>, ClassifierError> {
        Ok(one_hot(self.digit))
    }
}

/// Reads the digit from the glyph's gray level: digit `d` is drawn with
/// intensity `d * SHADE_STEP`. Lets tests check which region produced which
/// label without a trained model.
#[derive(Debug, Clone)]
pub struct ShadeClassifier {
    shape: TensorShape,
}

impl ShadeClassifier {
    pub const SHADE_STEP: u8 = 20;

    pub fn new(shape: TensorShape) -> Self {
        ShadeClassifier { shape }
    }

    /// Gray level to draw `digit` with.
    pub fn shade_for(digit: u8) -> u8 {
        digit.min(9) * Self::SHADE_STEP
    }
}

impl DigitClassifier for ShadeClassifier {
    fn input_shape(&self) -> TensorShape {
        self.shape
    }

    fn probabilities(&self, tensor: &NormalizedTensor) -> Result<Vec<f64>, ClassifierError> {
        let level = tensor.mean() * 255.0 / Self::SHADE_STEP as f64;
        let digit = (level.round().max(0.0) as usize).min(DIGIT_LABELS.len() - 1);
        Ok(one_hot(digit))
    }
}
