use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};
use crate::error::ModelError;

/// Fully connected layer: `a = f(x·W + b)`.
///
/// `weights` is `(input_size, size)` and `biases` is `(1, size)`. Inference
/// takes `&self`, so one loaded layer can serve many threads at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
}

impl Layer {
    pub fn new(weights: Matrix, biases: Matrix, activator: ActivationFunction) -> Result<Layer, ModelError> {
        let layer = Layer { size: weights.cols, weights, biases, activator };
        layer.check()?;
        Ok(layer)
    }

    /// Number of inputs this layer consumes.
    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Validates that weights, biases and `size` agree.
    pub fn check(&self) -> Result<(), ModelError> {
        self.weights.check_consistent()?;
        self.biases.check_consistent()?;
        if self.weights.cols != self.size {
            return Err(ModelError::Shape(format!(
                "layer of size {} has a weight matrix with {} columns",
                self.size, self.weights.cols
            )));
        }
        if self.biases.rows != 1 || self.biases.cols != self.size {
            return Err(ModelError::Shape(format!(
                "layer of size {} has biases of shape {}x{}",
                self.size, self.biases.rows, self.biases.cols
            )));
        }
        Ok(())
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        let mut z = self.weights.left_mul(input)?;
        if let Some(bias) = self.biases.as_row() {
            for (v, b) in z.iter_mut().zip(bias) {
                *v += b;
            }
        }
        self.activator.apply(&mut z);
        Ok(z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_applies_weights_bias_and_activation() {
        let w = Matrix::from_data(vec![vec![1.0, -1.0], vec![2.0, 0.0]]).unwrap();
        let b = Matrix::from_data(vec![vec![0.5, 0.0]]).unwrap();
        let layer = Layer::new(w, b, ActivationFunction::ReLU).unwrap();
        assert_eq!(layer.input_size(), 2);
        assert_eq!(layer.forward(&[1.0, 1.0]).unwrap(), vec![3.5, 0.0]);
    }

    #[test]
    fn bias_width_must_match_layer_size() {
        let w = Matrix::zeros(3, 2);
        let b = Matrix::zeros(1, 3);
        assert!(Layer::new(w, b, ActivationFunction::Identity).is_err());
    }
}
