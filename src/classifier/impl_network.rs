use crate::classifier::interface::{DigitClassifier, DIGIT_LABELS};
use crate::error::{ClassifierError, ModelError};
use crate::network::network::Network;
use crate::vision::normalize::{NormalizedTensor, TensorShape};

/// Classifier backed by a loaded dense `Network`.
///
/// Shapes are checked once here so that per-tensor inference can only fail
/// on a malformed tensor, never on a malformed model.
#[derive(Debug)]
pub struct NetworkClassifier {
    network: Network,
    shape: TensorShape,
}

impl NetworkClassifier {
    pub fn new(network: Network, shape: TensorShape) -> Result<Self, ModelError> {
        if network.input_size() != shape.len() {
            return Err(ModelError::Shape(format!(
                "network takes {} inputs but a {}x{}x{} tensor has {}",
                network.input_size(), shape.height, shape.width, shape.channels, shape.len()
            )));
        }
        if network.output_size() != DIGIT_LABELS.len() {
            return Err(ModelError::Shape(format!(
                "network has {} outputs, a digit model needs {}",
                network.output_size(), DIGIT_LABELS.len()
            )));
        }
        let declared = network
            .metadata
            .as_ref()
            .and_then(|m| m.input_type.as_ref())
            .and_then(|t| t.tensor_shape());
        if let Some(declared) = declared {
            if declared != shape {
                return Err(ModelError::Shape(format!(
                    "model metadata declares a {:?} input, expected {:?}",
                    declared, shape
                )));
            }
        }
        Ok(NetworkClassifier { network, shape })
    }

    pub fn description(&self) -> Option<&str> {
        self.network.metadata.as_ref().and_then(|m| m.description.as_deref())
    }
}

impl DigitClassifier for NetworkClassifier {
    fn input_shape(&self) -> TensorShape {
        self.shape
    }

    fn probabilities(&self, tensor: &NormalizedTensor) -> Result<Vec<f64>, ClassifierError> {
        Ok(self.network.forward(tensor.values())?)
    }
}
