use std::io::{Cursor, Read};

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

// ---------------------------------------------------------------------------
// Outgoing
// ---------------------------------------------------------------------------

/// A fully buffered HTTP response, independent of the server type so that
/// handlers can be exercised without a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn html(status: u16, body: String) -> Self {
        Reply { status, content_type: "text/html; charset=utf-8", body: body.into_bytes() }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Reply { status, content_type: "application/json", body }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Reply { status, content_type: "text/plain; charset=utf-8", body: body.as_bytes().to_vec() }
    }

    pub fn not_found() -> Self {
        Reply::text(404, "404 Not Found")
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or("")
    }

    pub fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let len = self.body.len();
        let headers = Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes())
            .into_iter()
            .collect::<Vec<_>>();
        Response::new(StatusCode(self.status), headers, Cursor::new(self.body), Some(len), None)
    }
}

// ---------------------------------------------------------------------------
// Incoming
// ---------------------------------------------------------------------------

/// The parts of a request the handlers look at, with the body read.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl IncomingRequest {
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((p, q)) => (p.to_owned(), q.to_owned()),
            None => (url.to_owned(), String::new()),
        };
        IncomingRequest { method, path, query, accept: None, content_type: None, body: Vec::new() }
    }
}

/// Why a request body could not be read.
#[derive(Debug)]
pub enum BodyError {
    TooLarge { limit: usize },
    Io(std::io::Error),
}

/// Reads method, URL, the headers we route on and at most `limit` body bytes.
///
/// On `Err`, the returned request carries everything except the body so the
/// caller can still pick a response mode.
pub fn read_request(request: &mut Request, limit: usize) -> Result<IncomingRequest, (IncomingRequest, BodyError)> {
    let mut incoming = IncomingRequest::new(request.method().clone(), request.url());
    for h in request.headers() {
        if h.field.equiv("Accept") {
            incoming.accept = Some(h.value.as_str().to_owned());
        } else if h.field.equiv("Content-Type") {
            incoming.content_type = Some(h.value.as_str().to_owned());
        }
    }

    if request.body_length().map_or(false, |n| n > limit) {
        return Err((incoming, BodyError::TooLarge { limit }));
    }

    let mut body = Vec::new();
    if let Err(e) = request.as_reader().take(limit as u64 + 1).read_to_end(&mut body) {
        return Err((incoming, BodyError::Io(e)));
    }
    if body.len() > limit {
        return Err((incoming, BodyError::TooLarge { limit }));
    }
    incoming.body = body;
    Ok(incoming)
}
