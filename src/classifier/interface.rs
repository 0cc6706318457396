use crate::error::ClassifierError;
use crate::vision::normalize::{NormalizedTensor, TensorShape};

/// Output labels, in probability-vector order.
pub const DIGIT_LABELS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Best label for one tensor, plus the distribution it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: char,
    pub confidence: f64,
    pub probabilities: Vec<f64>,
}

impl Prediction {
    /// Picks the first maximum, so ties go to the lower digit. NaN never wins.
    pub fn from_probabilities(probabilities: Vec<f64>) -> Result<Prediction, ClassifierError> {
        if probabilities.len() != DIGIT_LABELS.len() {
            return Err(ClassifierError::LabelCount {
                expected: DIGIT_LABELS.len(),
                actual: probabilities.len(),
            });
        }
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] || (probabilities[best].is_nan() && !p.is_nan()) {
                best = i;
            }
        }
        Ok(Prediction {
            label: DIGIT_LABELS[best],
            confidence: probabilities[best],
            probabilities,
        })
    }
}

/// A loaded digit model. Shared read-only across request threads.
pub trait DigitClassifier: Send + Sync {
    /// Tensor shape the model accepts.
    fn input_shape(&self) -> TensorShape;

    /// Raw probability vector over `DIGIT_LABELS`.
    fn probabilities(&self, tensor: &NormalizedTensor) -> Result<Vec<f64>, ClassifierError>;

    fn predict(&self, tensor: &NormalizedTensor) -> Result<Prediction, ClassifierError> {
        let expected = self.input_shape().len();
        if tensor.values().len() != expected {
            return Err(ClassifierError::ShapeMismatch { expected, actual: tensor.values().len() });
        }
        Prediction::from_probabilities(self.probabilities(tensor)?)
    }
}
