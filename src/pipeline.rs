//! Image bytes in, digit string out.
//!
//! `Recognizer` composes decode → segment → (normalize → classify) per region.
//! Regions are handled one after another in reading order, so the output
//! order needs no re-sorting. The recognizer holds no per-request state;
//! the injected classifier is the only thing shared between requests.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::classifier::interface::{DigitClassifier, Prediction};
use crate::config::{RecognizerConfig, RegionFailurePolicy};
use crate::error::RecognitionError;
use crate::vision::normalize::normalize;
use crate::vision::region::Region;
use crate::vision::segment::Segmenter;
use crate::vision::decoder::decode;

/// Character emitted for a region that could not be classified.
pub const UNRECOGNIZED: char = '?';

/// Outcome for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigitReading {
    pub region: Region,
    /// `None` when the region failed and the sentinel policy is in force.
    pub label: Option<char>,
    pub confidence: f64,
}

impl DigitReading {
    pub fn as_char(&self) -> char {
        self.label.unwrap_or(UNRECOGNIZED)
    }
}

/// Per-region readings in left-to-right order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Recognition {
    pub digits: Vec<DigitReading>,
}

impl Recognition {
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn unrecognized(&self) -> usize {
        self.digits.iter().filter(|d| d.label.is_none()).count()
    }
}

impl fmt::Display for Recognition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.digits {
            write!(f, "{}", d.as_char())?;
        }
        Ok(())
    }
}

pub struct Recognizer {
    segmenter: Segmenter,
    classifier: Arc<dyn DigitClassifier>,
    on_region_failure: RegionFailurePolicy,
}

impl Recognizer {
    pub fn new(config: RecognizerConfig, classifier: Arc<dyn DigitClassifier>) -> Self {
        Recognizer {
            segmenter: Segmenter::new(config.segmentation),
            classifier,
            on_region_failure: config.on_region_failure,
        }
    }

    /// Runs the full pipeline on encoded image bytes.
    ///
    /// A decode failure always fails the call. Zero regions is an empty,
    /// successful result.
    pub fn recognize(&self, bytes: &[u8]) -> Result<Recognition, RecognitionError> {
        let image = decode(bytes)?;
        debug!(width = image.width(), height = image.height(), "decoded image");

        let regions = self.segmenter.segment(&image);
        debug!(count = regions.len(), "segmented regions");

        let shape = self.classifier.input_shape();
        let mut digits = Vec::with_capacity(regions.len());
        for (index, region) in regions.into_iter().enumerate() {
            let outcome = normalize(&image, region, shape)
                .and_then(|tensor| self.classifier.predict(&tensor).map_err(RecognitionError::from));

            match outcome {
                Ok(Prediction { label, confidence, .. }) => {
                    debug!(index, %region, %label, confidence, "classified region");
                    digits.push(DigitReading { region, label: Some(label), confidence });
                }
                Err(err) => match self.on_region_failure {
                    RegionFailurePolicy::Abort => return Err(err),
                    RegionFailurePolicy::Sentinel => {
                        warn!(index, %region, error = %err, "region left unrecognized");
                        digits.push(DigitReading { region, label: None, confidence: 0.0 });
                    }
                },
            }
        }

        Ok(Recognition { digits })
    }
}
