//! HTTP surface of one single-script recognition service.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tiny_http::{Method, Request};
use tracing::{error, info, warn};

use crate::classifier::DigitClassifier;
use crate::config::BackendConfig;
use crate::error::ConfigError;
use crate::pipeline::Recognizer;
use crate::routing::response::{ResponseMode, RoutedResponse};
use crate::script::Script;
use crate::web::http::{read_request, BodyError, IncomingRequest, Reply};
use crate::web::multipart::{extract_boundary, file_part};
use crate::web::render::{render_page, Page};

pub struct BackendApp {
    script: Script,
    recognizer: Recognizer,
    max_upload_bytes: usize,
}

impl BackendApp {
    /// The classifier must accept the tensor shape of `config.script`.
    pub fn new(config: &BackendConfig, classifier: Arc<dyn DigitClassifier>) -> Result<Self, ConfigError> {
        config.validate()?;
        let expected = config.script.tensor_shape();
        if classifier.input_shape() != expected {
            return Err(ConfigError::invalid(format!(
                "{} backend needs a classifier for {:?} tensors, got {:?}",
                config.script,
                expected.dims(),
                classifier.input_shape().dims()
            )));
        }
        Ok(BackendApp {
            script: config.script,
            recognizer: Recognizer::new(config.recognizer.clone(), classifier),
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    pub fn script(&self) -> Script {
        self.script
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Runs recognition on one uploaded image.
    pub fn predict(&self, bytes: &[u8]) -> RoutedResponse {
        let started = Instant::now();
        match self.recognizer.recognize(bytes) {
            Ok(recognition) => {
                info!(
                    script = %self.script,
                    digits = recognition.len(),
                    unrecognized = recognition.unrecognized(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "recognized"
                );
                RoutedResponse::prediction(recognition.to_string())
            }
            Err(err) => {
                warn!(script = %self.script, error = %err, "recognition failed");
                RoutedResponse::error(500, err.to_string())
            }
        }
    }

    pub fn handle(&self, request: &IncomingRequest) -> Reply {
        match (&request.method, request.path.as_str()) {
            (Method::Get, "/") => Reply::html(200, render_page(Page::Backend(self.script), None)),
            (Method::Get, "/health") => Reply::json(200, &json!({"status": "ok", "script": self.script})),
            (Method::Post, "/api/predict") | (Method::Post, "/predict") | (Method::Post, "/") => {
                let outcome = self.predict_upload(request);
                self.respond(request, outcome)
            }
            _ => Reply::not_found(),
        }
    }

    fn predict_upload(&self, request: &IncomingRequest) -> RoutedResponse {
        let upload = request
            .content_type
            .as_deref()
            .and_then(extract_boundary)
            .and_then(|boundary| file_part(&request.body, &boundary, &[self.script.field_name()]).map(|p| p.data));

        match upload {
            Some(bytes) => self.predict(bytes),
            None => RoutedResponse::error(400, "No file provided"),
        }
    }

    fn respond(&self, request: &IncomingRequest, outcome: RoutedResponse) -> Reply {
        let mode = ResponseMode::detect(
            &request.path,
            request.accept.as_deref(),
            request.content_type.as_deref(),
        );
        render_outcome(Page::Backend(self.script), mode, outcome)
    }
}

/// Serializes an outcome for the client, keeping its status in both modes.
pub(crate) fn render_outcome(page: Page, mode: ResponseMode, outcome: RoutedResponse) -> Reply {
    match mode {
        ResponseMode::Json => Reply::json(outcome.status, &outcome.body),
        ResponseMode::Html => Reply::html(outcome.status, render_page(page, Some(&outcome.body))),
    }
}

/// Reply for a body that could not be read.
pub(crate) fn body_error_reply(page: Page, request: &IncomingRequest, err: BodyError) -> Reply {
    let mode = ResponseMode::detect(&request.path, request.accept.as_deref(), request.content_type.as_deref());
    let outcome = match err {
        BodyError::TooLarge { limit } => {
            warn!(path = %request.path, limit, "upload too large");
            RoutedResponse::error(413, format!("Upload exceeds the {} byte limit.", limit))
        }
        BodyError::Io(e) => {
            warn!(path = %request.path, error = %e, "cannot read request body");
            RoutedResponse::error(400, "Cannot read request body.")
        }
    };
    render_outcome(page, mode, outcome)
}

/// Reads one request, handles it, and writes the reply.
pub fn dispatch(mut request: Request, app: &BackendApp) {
    let reply = match read_request(&mut request, app.max_upload_bytes()) {
        Ok(incoming) => app.handle(&incoming),
        Err((incoming, err)) => body_error_reply(Page::Backend(app.script()), &incoming, err),
    };
    let status = reply.status;
    if let Err(e) = request.respond(reply.into_response()) {
        error!(status, error = %e, "failed to send response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{FixedClassifier, ShadeClassifier};
    use crate::web::multipart::encode_file_part;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn app(script: Script) -> BackendApp {
        let classifier = Arc::new(ShadeClassifier::new(script.tensor_shape()));
        BackendApp::new(&BackendConfig::new(script), classifier).unwrap()
    }

    /// White canvas with one filled block per digit, shaded by value.
    fn digits_png(digits: &[u8]) -> Vec<u8> {
        let mut img = RgbImage::from_pixel(40 + 30 * digits.len() as u32, 60, Rgb([255, 255, 255]));
        for (i, &d) in digits.iter().enumerate() {
            let shade = ShadeClassifier::shade_for(d);
            let x0 = 20 + 30 * i as u32;
            for y in 15..45 {
                for x in x0..x0 + 14 {
                    img.put_pixel(x, y, Rgb([shade, shade, shade]));
                }
            }
        }
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    fn upload(path: &str, field: &str, data: &[u8]) -> IncomingRequest {
        let (content_type, body) = encode_file_part(field, "digits.png", "image/png", data);
        let mut req = IncomingRequest::new(Method::Post, path);
        req.content_type = Some(content_type);
        req.body = body;
        req
    }

    #[test]
    fn rejects_mismatched_classifier() {
        let classifier = Arc::new(FixedClassifier::new(Script::Decimal.tensor_shape(), 1));
        assert!(BackendApp::new(&BackendConfig::new(Script::Devanagari), classifier).is_err());
    }

    #[test]
    fn api_predict_returns_digits() {
        let app = app(Script::Decimal);
        let reply = app.handle(&upload("/api/predict", "file", &digits_png(&[4, 0, 7])));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body_str(), r#"{"prediction":"407"}"#);
    }

    #[test]
    fn field_name_follows_script() {
        let app = app(Script::Devanagari);
        let png = digits_png(&[3]);
        assert_eq!(app.handle(&upload("/api/predict", "image", &png)).body_str(), r#"{"prediction":"3"}"#);

        let reply = app.handle(&upload("/api/predict", "file", &png));
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body_str(), r#"{"error":"No file provided"}"#);
    }

    #[test]
    fn undecodable_upload_is_a_server_error() {
        let reply = app(Script::Decimal).handle(&upload("/api/predict", "file", b"not an image"));
        assert_eq!(reply.status, 500);
        assert!(reply.body_str().starts_with(r#"{"error":"cannot decode image"#));
    }

    #[test]
    fn form_posts_render_html() {
        let app = app(Script::Decimal);
        let reply = app.handle(&upload("/predict", "file", &digits_png(&[9, 1])));
        assert_eq!(reply.status, 200);
        assert!(reply.content_type.starts_with("text/html"));
        assert!(reply.body_str().contains(r#"<div class="prediction-hero">91</div>"#));

        let mut req = upload("/", "file", &digits_png(&[2]));
        req.accept = Some("application/json".into());
        assert_eq!(app.handle(&req).body_str(), r#"{"prediction":"2"}"#);
    }

    #[test]
    fn health_and_unknown_paths() {
        let app = app(Script::Devanagari);
        let health = app.handle(&IncomingRequest::new(Method::Get, "/health"));
        assert_eq!(health.body_str(), r#"{"script":"devanagari","status":"ok"}"#);
        assert_eq!(app.handle(&IncomingRequest::new(Method::Get, "/nope")).status, 404);
        assert_eq!(app.handle(&IncomingRequest::new(Method::Get, "/api/predict")).status, 404);
    }

    #[test]
    fn oversized_body_is_413() {
        let req = IncomingRequest::new(Method::Post, "/api/predict");
        let reply = body_error_reply(Page::Backend(Script::Decimal), &req, BodyError::TooLarge { limit: 10 });
        assert_eq!(reply.status, 413);
        assert!(reply.body_str().contains("10 byte limit"));
    }
}
