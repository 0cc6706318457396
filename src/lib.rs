pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod error;
pub mod config;
pub mod script;
pub mod vision;
pub mod classifier;
pub mod pipeline;
pub mod routing;
pub mod web;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use script::Script;
pub use classifier::{DigitClassifier, NetworkClassifier, Prediction};
pub use pipeline::{Recognition, Recognizer};
pub use routing::{Aggregator, PredictRequest, RoutedResponse, UnifiedResponse};
pub use config::{BackendConfig, RecognizerConfig, RouterConfig};
