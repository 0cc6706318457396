//! Minimal `multipart/form-data` support: parsing inbound form posts and
//! encoding the single-file bodies the router forwards to backends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part<'a> {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: &'a [u8],
}

impl Part<'_> {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.len() > 9 && s[..9].eq_ignore_ascii_case("boundary="))
        .map(|s| s[9..].trim_matches('"').to_owned())
        .filter(|b| !b.is_empty())
}

/// Splits a multipart body into its parts. Malformed parts are skipped.
pub fn parse_parts<'a>(body: &'a [u8], boundary: &str) -> Vec<Part<'a>> {
    let delimiter = format!("--{}", boundary);
    let sep = b"\r\n\r\n";

    split_on(body, delimiter.as_bytes())
        .into_iter()
        .filter_map(|raw| {
            let raw = raw.strip_prefix(b"\r\n").unwrap_or(raw);
            let sep_pos = find_subsequence(raw, sep)?;
            let headers = String::from_utf8_lossy(&raw[..sep_pos]);
            let data = &raw[sep_pos + sep.len()..];
            let data = data.strip_suffix(b"\r\n").unwrap_or(data);

            let mut part = Part { name: None, filename: None, content_type: None, data };
            for line in headers.lines() {
                let Some((key, value)) = line.split_once(':') else { continue };
                let key = key.trim();
                if key.eq_ignore_ascii_case("Content-Disposition") {
                    part.name = disposition_param(value, "name");
                    part.filename = disposition_param(value, "filename");
                } else if key.eq_ignore_ascii_case("Content-Type") {
                    part.content_type = Some(value.trim().to_owned());
                }
            }
            part.name.as_ref()?;
            Some(part)
        })
        .collect()
}

/// First file part whose field name is one of `names`, tried in order.
pub fn file_part<'a>(body: &'a [u8], boundary: &str, names: &[&str]) -> Option<Part<'a>> {
    let parts = parse_parts(body, boundary);
    names.iter().find_map(|name| {
        parts
            .iter()
            .find(|p| p.is_file() && p.name.as_deref() == Some(name) && !p.data.is_empty())
            .cloned()
    })
}

/// Extracts a plain-text (non-file) field from a multipart body.
pub fn text_field(body: &[u8], boundary: &str, field_name: &str) -> Option<String> {
    parse_parts(body, boundary)
        .into_iter()
        .find(|p| !p.is_file() && p.name.as_deref() == Some(field_name))
        .and_then(|p| String::from_utf8(p.data.to_vec()).ok())
}

/// Parses `key="value"` (or unquoted `key=value`) out of a
/// Content-Disposition value. `name` does not match `filename`.
fn disposition_param(disposition: &str, key: &str) -> Option<String> {
    disposition.split(';').map(str::trim).find_map(|param| {
        let (k, v) = param.split_once('=')?;
        if k.trim().eq_ignore_ascii_case(key) {
            Some(v.trim().trim_matches('"').to_owned())
        } else {
            None
        }
    })
}

static BOUNDARY_COUNTER: AtomicU64 = AtomicU64::new(0);

fn fresh_boundary(data: &[u8]) -> String {
    loop {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let n = BOUNDARY_COUNTER.fetch_add(1, Ordering::Relaxed);
        let boundary = format!("digit-lens-{:08x}{:08x}", nanos, n);
        if find_subsequence(data, boundary.as_bytes()).is_none() {
            return boundary;
        }
    }
}

/// Encodes a body holding a single file field.
///
/// Returns the `Content-Type` header value (with boundary) and the body.
pub fn encode_file_part(field: &str, filename: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = fresh_boundary(data);
    let filename = filename.replace(['"', '\r', '\n'], "_");

    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n", field, filename).as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}
