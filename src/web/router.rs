//! HTTP surface of the routing front end.

use serde_json::json;
use tiny_http::{Method, Request};
use tracing::error;

use crate::routing::aggregator::{Aggregator, PredictRequest};
use crate::routing::response::ResponseMode;
use crate::routing::transport::Upload;
use crate::web::backend::{body_error_reply, render_outcome};
use crate::web::form::{form_get, parse_form};
use crate::web::http::{read_request, IncomingRequest, Reply};
use crate::web::multipart::{extract_boundary, file_part, text_field};
use crate::web::render::{render_page, Page};

/// Accepted upload field names, in order of preference.
const IMAGE_FIELDS: [&str; 2] = ["image", "file"];

pub fn handle(aggregator: &Aggregator, request: &IncomingRequest) -> Reply {
    match (&request.method, request.path.as_str()) {
        (Method::Get, "/") => Reply::html(200, render_page(Page::Router, None)),
        (Method::Get, "/health") => Reply::json(200, &json!({"status": "ok"})),
        (Method::Post, "/predict") | (Method::Post, "/api/predict") => {
            let outcome = aggregator.unified_predict(predict_request(request));
            let mode = ResponseMode::detect(
                &request.path,
                request.accept.as_deref(),
                request.content_type.as_deref(),
            );
            render_outcome(Page::Router, mode, outcome)
        }
        _ => Reply::not_found(),
    }
}

/// Pulls the upload and `model_type` out of a request. `model_type` comes
/// from the multipart form first, then the query string; a blank form value
/// counts as absent.
pub fn predict_request(request: &IncomingRequest) -> PredictRequest {
    let boundary = request.content_type.as_deref().and_then(extract_boundary);

    let image = boundary.as_deref().and_then(|b| {
        file_part(&request.body, b, &IMAGE_FIELDS).map(|part| Upload {
            filename: part.filename,
            content_type: part.content_type,
            bytes: part.data.to_vec(),
        })
    });

    let model_type = boundary
        .as_deref()
        .and_then(|b| text_field(&request.body, b, "model_type"))
        .filter(|m| !m.trim().is_empty())
        .or_else(|| form_get(&parse_form(&request.query), "model_type").map(str::to_owned));

    PredictRequest { image, model_type }
}

/// Reads one request, handles it, and writes the reply.
pub fn dispatch(mut request: Request, aggregator: &Aggregator, max_upload_bytes: usize) {
    let reply = match read_request(&mut request, max_upload_bytes) {
        Ok(incoming) => handle(aggregator, &incoming),
        Err((incoming, err)) => body_error_reply(Page::Router, &incoming, err),
    };
    let status = reply.status;
    if let Err(e) = request.respond(reply.into_response()) {
        error!(status, error = %e, "failed to send response");
    }
}
