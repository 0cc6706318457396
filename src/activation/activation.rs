use serde::{Serialize, Deserialize};
use std::f64::consts::{E, PI};

/// Activation applied after a dense layer's linear transform.
///
/// Variant names match the saved-model format, so models exported with any of
/// these activations load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Vector-valued; applied over the whole layer output by `apply`.
    Softmax,
    Tanh,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

impl ActivationFunction {
    /// Element-wise activation. `Softmax` has no scalar form and passes the
    /// value through; use `apply` for whole-layer activation.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { x } else { alpha * (E.powf(x) - 1.0) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x / (1.0 + E.powf(-x)),
        }
    }

    /// Activates a full pre-activation vector in place.
    pub fn apply(&self, z: &mut [f64]) {
        match self {
            ActivationFunction::Softmax => softmax(z),
            other => z.iter_mut().for_each(|v| *v = other.function(*v)),
        }
    }
}

/// Numerically stable softmax (max-shifted).
fn softmax(z: &mut [f64]) {
    let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in z.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        z.iter_mut().for_each(|v| *v /= sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_and_keeps_order() {
        let mut z = vec![1.0, 3.0, 2.0];
        ActivationFunction::Softmax.apply(&mut z);
        let sum: f64 = z.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(z[1] > z[2] && z[2] > z[0]);
    }

    #[test]
    fn softmax_survives_large_logits() {
        let mut z = vec![1000.0, 1000.0];
        ActivationFunction::Softmax.apply(&mut z);
        assert!((z[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn relu_is_element_wise() {
        let mut z = vec![-1.0, 0.5];
        ActivationFunction::ReLU.apply(&mut z);
        assert_eq!(z, vec![0.0, 0.5]);
    }
}
