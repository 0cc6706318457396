use serde::{Deserialize, Serialize};

/// The one reply shape every client sees: `{"prediction": ...}` or
/// `{"error": ...}`, never both, never neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnifiedResponse {
    Prediction(String),
    Error(String),
}

/// A unified response plus the HTTP status to send it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedResponse {
    pub status: u16,
    pub body: UnifiedResponse,
}

impl RoutedResponse {
    pub fn prediction(text: impl Into<String>) -> Self {
        RoutedResponse { status: 200, body: UnifiedResponse::Prediction(text.into()) }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        RoutedResponse { status, body: UnifiedResponse::Error(message.into()) }
    }
}

/// How a reply is serialized. Chosen once per request at the HTTP edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Json,
    Html,
}

impl ResponseMode {
    /// JSON for API paths and for clients that send or accept JSON; HTML
    /// for everything else (browser form posts).
    pub fn detect(path: &str, accept: Option<&str>, content_type: Option<&str>) -> Self {
        let wants_json = |h: Option<&str>| h.map_or(false, |v| v.contains("application/json"));
        if path.starts_with("/api") || wants_json(accept) || wants_json(content_type) {
            ResponseMode::Json
        } else {
            ResponseMode::Html
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_a_single_key() {
        let json = |r: UnifiedResponse| serde_json::to_string(&r).unwrap();
        assert_eq!(json(UnifiedResponse::Prediction("123".into())), r#"{"prediction":"123"}"#);
        assert_eq!(json(UnifiedResponse::Error("bad".into())), r#"{"error":"bad"}"#);
    }

    #[test]
    fn parses_backend_shapes() {
        let p: UnifiedResponse = serde_json::from_str(r#"{"prediction":"42"}"#).unwrap();
        assert_eq!(p, UnifiedResponse::Prediction("42".into()));
        assert!(serde_json::from_str::<UnifiedResponse>(r#"{"prediction":"1","error":"x"}"#).is_err());
    }

    #[test]
    fn mode_detection() {
        assert_eq!(ResponseMode::detect("/api/predict", None, None), ResponseMode::Json);
        assert_eq!(ResponseMode::detect("/predict", Some("application/json"), None), ResponseMode::Json);
        assert_eq!(
            ResponseMode::detect("/predict", Some("text/html,*/*"), Some("multipart/form-data; boundary=x")),
            ResponseMode::Html
        );
        assert_eq!(ResponseMode::detect("/predict", None, Some("application/json")), ResponseMode::Json);
    }
}
