use std::io::Read;
use std::time::Duration;

use crate::error::TransportError;
use crate::routing::descriptor::BackendDescriptor;
use crate::web::multipart::encode_file_part;

/// An uploaded image as received by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Upload { filename: None, content_type: None, bytes }
    }
}

/// Whatever the backend answered, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends an image to a backend. `Err` means no HTTP reply was obtained.
pub trait BackendTransport: Send + Sync {
    fn send(&self, backend: &BackendDescriptor, upload: &Upload) -> Result<BackendReply, TransportError>;
}

/// Backend replies beyond this size are truncated.
const MAX_REPLY_BYTES: u64 = 1024 * 1024;

/// Blocking HTTP transport with a whole-request timeout.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        HttpTransport { agent }
    }
}

impl BackendTransport for HttpTransport {
    fn send(&self, backend: &BackendDescriptor, upload: &Upload) -> Result<BackendReply, TransportError> {
        let (content_type, body) = encode_file_part(
            backend.field_name,
            upload.filename.as_deref().unwrap_or("upload"),
            upload.content_type.as_deref().unwrap_or("application/octet-stream"),
            &upload.bytes,
        );

        let result = self
            .agent
            .post(&backend.endpoint)
            .set("Content-Type", &content_type)
            .set("Accept", "application/json")
            .send_bytes(&body);

        match result {
            Ok(resp) | Err(ureq::Error::Status(_, resp)) => read_reply(resp),
            Err(ureq::Error::Transport(t)) => Err(TransportError { detail: t.to_string() }),
        }
    }
}

fn read_reply(resp: ureq::Response) -> Result<BackendReply, TransportError> {
    let status = resp.status();
    let mut body = Vec::new();
    resp.into_reader()
        .take(MAX_REPLY_BYTES)
        .read_to_end(&mut body)
        .map_err(|e| TransportError { detail: format!("reading reply: {}", e) })?;
    Ok(BackendReply { status, body })
}
