use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::ModelError;
use crate::layers::dense::Layer;
use crate::network::metadata::ModelMetadata;
use crate::network::spec::{NetworkSpec, LayerWeights};

/// A loaded feed-forward network. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a network and checks that consecutive layers chain together.
    pub fn new(layers: Vec<Layer>, metadata: Option<ModelMetadata>) -> Result<Network, ModelError> {
        let network = Network { layers, metadata };
        network.validate()?;
        Ok(network)
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size())
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::Shape("network has no layers".into()));
        }
        for layer in &self.layers {
            layer.check()?;
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].size != pair[1].input_size() {
                return Err(ModelError::Shape(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i, pair[0].size, i + 1, pair[1].input_size()
                )));
            }
        }
        Ok(())
    }

    /// Forward pass.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Loads a single-file model (layers plus optional metadata).
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network, ModelError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ModelError::io(path, e))?;
        let reader = std::io::BufReader::new(file);
        let network: Network = serde_json::from_reader(reader).map_err(|e| ModelError::parse(path, e))?;
        network.validate()?;
        Ok(network)
    }

    /// Loads an architecture file and a separate weights file and joins them.
    pub fn load_pair(architecture: impl AsRef<Path>, weights: impl AsRef<Path>) -> Result<Network, ModelError> {
        let spec = NetworkSpec::load_json(architecture)?;
        let weights = LayerWeights::load_json(weights)?;
        spec.build(weights)
    }

    /// Writes the network as a pretty-printed JSON file readable by `load_json`.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| ModelError::io(path, e))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| ModelError::parse(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::math::matrix::Matrix;

    fn layer(rows: usize, cols: usize, act: ActivationFunction) -> Layer {
        Layer::new(Matrix::zeros(rows, cols), Matrix::zeros(1, cols), act).unwrap()
    }

    #[test]
    fn mismatched_chain_is_rejected() {
        let res = Network::new(
            vec![layer(4, 3, ActivationFunction::ReLU), layer(2, 10, ActivationFunction::Softmax)],
            None,
        );
        assert!(matches!(res, Err(ModelError::Shape(_))));
    }

    #[test]
    fn zero_network_outputs_uniform_softmax() {
        let net = Network::new(
            vec![layer(4, 3, ActivationFunction::ReLU), layer(3, 10, ActivationFunction::Softmax)],
            None,
        )
        .unwrap();
        let out = net.forward(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|p| (p - 0.1).abs() < 1e-12));
    }

    #[test]
    fn save_then_load_keeps_shape() {
        let net = Network::new(vec![layer(6, 10, ActivationFunction::Softmax)], None).unwrap();
        let path = std::env::temp_dir().join(format!("digit-lens-net-{}.json", std::process::id()));
        net.save_json(&path).unwrap();
        let loaded = Network::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.input_size(), 6);
        assert_eq!(loaded.output_size(), 10);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Network::load_json("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
