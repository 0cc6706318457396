use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::ModelError;
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`: number of neurons in this layer
/// - `input_size`: number of values feeding into this layer
/// - `activation`: activation function applied after the linear transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

/// Architecture half of a split model: layer shapes and activations, with
/// no parameters. Paired with a `LayerWeights` file at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

/// Parameter half of a split model, one entry per layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerWeights {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl NetworkSpec {
    pub fn load_json(path: impl AsRef<Path>) -> Result<NetworkSpec, ModelError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ModelError::io(path, e))?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| ModelError::parse(path, e))
    }

    /// Joins this architecture with per-layer parameters.
    ///
    /// Every weight matrix must be `(input_size, size)` and every bias row
    /// `(1, size)` as declared by the matching `LayerSpec`.
    pub fn build(self, weights: Vec<LayerWeights>) -> Result<Network, ModelError> {
        if weights.len() != self.layers.len() {
            return Err(ModelError::Shape(format!(
                "architecture '{}' has {} layers but {} weight entries were given",
                self.name, self.layers.len(), weights.len()
            )));
        }
        let mut layers = Vec::with_capacity(weights.len());
        for (i, (spec, params)) in self.layers.into_iter().zip(weights).enumerate() {
            if params.weights.rows != spec.input_size || params.weights.cols != spec.size {
                return Err(ModelError::Shape(format!(
                    "layer {}: expected {}x{} weights, found {}x{}",
                    i, spec.input_size, spec.size, params.weights.rows, params.weights.cols
                )));
            }
            layers.push(Layer::new(params.weights, params.biases, spec.activation)?);
        }
        Network::new(layers, self.metadata)
    }
}

impl LayerWeights {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<LayerWeights>, ModelError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ModelError::io(path, e))?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| ModelError::parse(path, e))
    }
}
