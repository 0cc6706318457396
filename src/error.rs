//! Error types for recognition, model loading, configuration and routing.
//!
//! Lower layers return these with `?`; only the recognizer's per-region
//! policy, the backend HTTP handlers and the aggregator turn them into a
//! client-facing response.

use std::path::Path;

use thiserror::Error;

use crate::script::Script;
use crate::vision::region::Region;

/// Failures inside one recognition request.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// The uploaded bytes are not an image the decoder understands.
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// A region with zero width or height.
    #[error("region {region} has an empty crop")]
    EmptyCrop { region: Region },

    /// A region that does not fit inside the source image.
    #[error("region {region} lies outside the {width}x{height} image")]
    RegionOutOfBounds { region: Region, width: u32, height: u32 },

    /// Target tensor asks for a channel layout the normalizer cannot build.
    #[error("cannot build a tensor with {channels} channels")]
    UnsupportedChannels { channels: u32 },

    #[error("classifier: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Failures of the classifier adapter on one tensor.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("tensor has {actual} values, classifier expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("classifier produced {actual} probabilities for {expected} labels")]
    LabelCount { expected: usize, actual: usize },

    #[error(transparent)]
    Network(#[from] ModelError),
}

/// Problems loading or assembling a model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model shape: {0}")]
    Shape(String),
}

impl ModelError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ModelError::Io { path: path.display().to_string(), source }
    }

    pub fn parse(path: &Path, source: serde_json::Error) -> Self {
        ModelError::Parse { path: path.display().to_string(), source }
    }
}

/// Invalid service configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid { message: message.into() }
    }
}

/// Rejected router input. The display strings are the client-facing text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Both 'image' and 'model_type' are required.")]
    MissingInput,

    #[error("model_type must be 'decimal' or 'devanagari'.")]
    UnsupportedModelType(String),
}

/// Router-to-backend failures.
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend could not be reached or did not answer in time.
    #[error("{script} backend at {endpoint} is unavailable: {detail}")]
    BackendUnavailable {
        script: Script,
        endpoint: String,
        detail: String,
    },

    /// The backend answered with a non-success status and an error message.
    #[error("{script} backend rejected the request ({status}): {message}")]
    BackendRejected {
        script: Script,
        status: u16,
        message: String,
    },

    /// The backend answered with a body the router cannot interpret.
    #[error("{script} backend returned an invalid response ({status}): {detail}")]
    InvalidBackendReply {
        script: Script,
        status: u16,
        detail: String,
    },
}

/// A backend call that produced no HTTP reply at all.
#[derive(Error, Debug)]
#[error("{detail}")]
pub struct TransportError {
    pub detail: String,
}

impl RoutingError {
    /// HTTP status the router answers with.
    pub fn status(&self) -> u16 {
        match self {
            RoutingError::Validation(_) => 400,
            RoutingError::BackendRejected { status, .. } if *status >= 500 => *status,
            RoutingError::BackendRejected { .. } | RoutingError::InvalidBackendReply { .. } => 502,
            RoutingError::BackendUnavailable { .. } => 503,
        }
    }

    /// Text shown to the client. Backend-reported errors pass through as-is;
    /// transport details stay in the log.
    pub fn client_message(&self) -> String {
        match self {
            RoutingError::Validation(v) => v.to_string(),
            RoutingError::BackendRejected { message, .. } => message.clone(),
            RoutingError::InvalidBackendReply { .. } => "Backend returned an invalid response.".into(),
            RoutingError::BackendUnavailable { script, .. } => {
                format!("The {} recognition service is unavailable.", script)
            }
        }
    }
}
