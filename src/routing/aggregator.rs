//! Validates router input, forwards it to the right backend and folds every
//! outcome into a `RoutedResponse`.

use std::sync::Arc;
use std::thread;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::RetryPolicy;
use crate::error::{RoutingError, ValidationError};
use crate::routing::descriptor::{BackendDescriptor, Backends};
use crate::routing::response::RoutedResponse;
use crate::routing::transport::{BackendReply, BackendTransport, Upload};
use crate::script::Script;

/// Router input after HTTP parsing, before validation.
#[derive(Debug, Clone, Default)]
pub struct PredictRequest {
    pub image: Option<Upload>,
    pub model_type: Option<String>,
}

/// Backend reply body. Both keys optional so that odd replies are
/// classified here rather than failing to parse.
#[derive(Deserialize)]
struct BackendBody {
    prediction: Option<String>,
    error: Option<String>,
}

pub struct Aggregator {
    backends: Backends,
    transport: Arc<dyn BackendTransport>,
    retry: RetryPolicy,
}

impl Aggregator {
    pub fn new(backends: Backends, transport: Arc<dyn BackendTransport>, retry: RetryPolicy) -> Self {
        Aggregator { backends, transport, retry }
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Presence is checked before the model type's value.
    pub fn validate(request: PredictRequest) -> Result<(Script, Upload), ValidationError> {
        let image = request.image.filter(|u| !u.bytes.is_empty());
        let model_type = request
            .model_type
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty());

        match (image, model_type) {
            (Some(image), Some(model_type)) => Ok((model_type.parse()?, image)),
            _ => Err(ValidationError::MissingInput),
        }
    }

    /// Full request: validation, forwarding, reshaping.
    pub fn unified_predict(&self, request: PredictRequest) -> RoutedResponse {
        let outcome = Self::validate(request)
            .map_err(RoutingError::from)
            .and_then(|(script, upload)| self.forward(script, &upload));

        match outcome {
            Ok(prediction) => RoutedResponse::prediction(prediction),
            Err(err) => {
                if !matches!(err, RoutingError::Validation(_)) {
                    warn!(error = %err, "prediction failed");
                }
                RoutedResponse::error(err.status(), err.client_message())
            }
        }
    }

    /// Sends `upload` to the backend for `script` and returns its prediction.
    ///
    /// Only transport failures are retried; any HTTP reply is final.
    pub fn forward(&self, script: Script, upload: &Upload) -> Result<String, RoutingError> {
        let backend = self.backends.get(script);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.transport.send(backend, upload) {
                Ok(reply) => {
                    info!(%script, status = reply.status, attempt, "backend replied");
                    return interpret(backend, reply);
                }
                Err(err) if attempt < max_attempts => {
                    warn!(%script, endpoint = %backend.endpoint, attempt, error = %err, "backend call failed, retrying");
                    attempt += 1;
                    thread::sleep(self.retry.delay_before(attempt));
                }
                Err(err) => {
                    error!(%script, endpoint = %backend.endpoint, attempt, error = %err, "backend unavailable");
                    return Err(RoutingError::BackendUnavailable {
                        script,
                        endpoint: backend.endpoint.clone(),
                        detail: err.detail,
                    });
                }
            }
        }
    }
}

fn interpret(backend: &BackendDescriptor, reply: BackendReply) -> Result<String, RoutingError> {
    let script = backend.script;
    let status = reply.status;
    let parsed = serde_json::from_slice::<BackendBody>(&reply.body);

    if (200..300).contains(&status) {
        return match parsed {
            Ok(BackendBody { prediction: Some(prediction), error: None }) => Ok(prediction),
            Ok(_) => Err(RoutingError::InvalidBackendReply {
                script,
                status,
                detail: "expected exactly a 'prediction' field".into(),
            }),
            Err(e) => Err(RoutingError::InvalidBackendReply { script, status, detail: e.to_string() }),
        };
    }

    let message = parsed
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| "Unknown error.".to_owned());
    Err(RoutingError::BackendRejected { script, status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::routing::response::UnifiedResponse;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every call and answers from a script of canned results.
    struct ScriptedTransport {
        calls: Mutex<Vec<(String, &'static str, Vec<u8>)>>,
        replies: Mutex<Vec<Result<BackendReply, TransportError>>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<BackendReply, TransportError>>) -> Arc<Self> {
            Arc::new(ScriptedTransport { calls: Mutex::new(vec![]), replies: Mutex::new(replies) })
        }
    }

    impl BackendTransport for ScriptedTransport {
        fn send(&self, backend: &BackendDescriptor, upload: &Upload) -> Result<BackendReply, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((backend.endpoint.clone(), backend.field_name, upload.bytes.clone()));
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn ok(body: &str) -> Result<BackendReply, TransportError> {
        Ok(BackendReply { status: 200, body: body.as_bytes().to_vec() })
    }

    fn refused() -> Result<BackendReply, TransportError> {
        Err(TransportError { detail: "Connection refused".into() })
    }

    fn aggregator(transport: Arc<ScriptedTransport>, attempts: u32) -> Aggregator {
        Aggregator::new(
            Backends::new("http://dec/api/predict", "http://dev/api/predict"),
            transport,
            RetryPolicy { max_attempts: attempts, backoff: Duration::ZERO },
        )
    }

    fn request(image: Option<&[u8]>, model_type: Option<&str>) -> PredictRequest {
        PredictRequest {
            image: image.map(|b| Upload::new(b.to_vec())),
            model_type: model_type.map(str::to_owned),
        }
    }

    #[test]
    fn missing_image_is_rejected_before_model_type() {
        let t = ScriptedTransport::new(vec![]);
        let resp = aggregator(t.clone(), 1).unified_predict(request(None, Some("klingon")));
        assert_eq!(resp, RoutedResponse::error(400, "Both 'image' and 'model_type' are required."));
        assert!(t.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_upload_counts_as_missing() {
        let t = ScriptedTransport::new(vec![]);
        let resp = aggregator(t, 1).unified_predict(request(Some(b""), Some("decimal")));
        assert_eq!(resp.status, 400);
    }

    #[test]
    fn missing_or_unknown_model_type() {
        let t = ScriptedTransport::new(vec![]);
        let agg = aggregator(t, 1);
        assert_eq!(
            agg.unified_predict(request(Some(b"img"), None)).body,
            UnifiedResponse::Error("Both 'image' and 'model_type' are required.".into())
        );
        assert_eq!(
            agg.unified_predict(request(Some(b"img"), Some("roman"))),
            RoutedResponse::error(400, "model_type must be 'decimal' or 'devanagari'.")
        );
    }

    #[test]
    fn routes_by_model_type_with_matching_field() {
        let t = ScriptedTransport::new(vec![ok(r#"{"prediction":"12"}"#), ok(r#"{"prediction":"34"}"#)]);
        let agg = aggregator(t.clone(), 1);

        assert_eq!(agg.unified_predict(request(Some(b"a"), Some("decimal"))), RoutedResponse::prediction("12"));
        assert_eq!(agg.unified_predict(request(Some(b"b"), Some("devanagari"))), RoutedResponse::prediction("34"));

        let calls = t.calls.lock().unwrap();
        assert_eq!(calls[0], ("http://dec/api/predict".into(), "file", b"a".to_vec()));
        assert_eq!(calls[1], ("http://dev/api/predict".into(), "image", b"b".to_vec()));
    }

    #[test]
    fn backend_error_passes_through_verbatim() {
        let t = ScriptedTransport::new(vec![Ok(BackendReply {
            status: 500,
            body: br#"{"error":"cannot decode image: bad png"}"#.to_vec(),
        })]);
        let resp = aggregator(t, 1).unified_predict(request(Some(b"x"), Some("decimal")));
        assert_eq!(resp, RoutedResponse::error(500, "cannot decode image: bad png"));
    }

    #[test]
    fn backend_client_error_maps_to_bad_gateway() {
        let t = ScriptedTransport::new(vec![Ok(BackendReply {
            status: 400,
            body: br#"{"error":"No file provided"}"#.to_vec(),
        })]);
        let resp = aggregator(t, 1).unified_predict(request(Some(b"x"), Some("devanagari")));
        assert_eq!(resp, RoutedResponse::error(502, "No file provided"));
    }

    #[test]
    fn error_without_message_is_unknown() {
        let t = ScriptedTransport::new(vec![Ok(BackendReply { status: 503, body: b"<html>down</html>".to_vec() })]);
        let resp = aggregator(t, 1).unified_predict(request(Some(b"x"), Some("decimal")));
        assert_eq!(resp, RoutedResponse::error(503, "Unknown error."));
    }

    #[test]
    fn malformed_success_body_is_an_error() {
        let t = ScriptedTransport::new(vec![ok("not json"), ok(r#"{"digits":"1"}"#)]);
        let agg = aggregator(t, 1);
        for _ in 0..2 {
            let resp = agg.unified_predict(request(Some(b"x"), Some("decimal")));
            assert_eq!(resp, RoutedResponse::error(502, "Backend returned an invalid response."));
        }
    }

    #[test]
    fn unreachable_backend_is_generic_unavailable() {
        let t = ScriptedTransport::new(vec![refused()]);
        let resp = aggregator(t, 1).unified_predict(request(Some(b"x"), Some("devanagari")));
        assert_eq!(resp, RoutedResponse::error(503, "The devanagari recognition service is unavailable."));
    }

    #[test]
    fn transport_failures_are_retried_up_to_the_limit() {
        let t = ScriptedTransport::new(vec![refused(), ok(r#"{"prediction":"7"}"#)]);
        let resp = aggregator(t.clone(), 2).unified_predict(request(Some(b"x"), Some("decimal")));
        assert_eq!(resp, RoutedResponse::prediction("7"));
        assert_eq!(t.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn http_errors_are_not_retried() {
        let t = ScriptedTransport::new(vec![Ok(BackendReply { status: 500, body: br#"{"error":"boom"}"#.to_vec() })]);
        let resp = aggregator(t.clone(), 3).unified_predict(request(Some(b"x"), Some("decimal")));
        assert_eq!(resp.status, 500);
        assert_eq!(t.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn model_type_is_trimmed() {
        let t = ScriptedTransport::new(vec![ok(r#"{"prediction":"5"}"#)]);
        let resp = aggregator(t, 1).unified_predict(request(Some(b"x"), Some(" decimal\r\n")));
        assert_eq!(resp, RoutedResponse::prediction("5"));
    }
}
