//! Raw transport responses and the response envelope returned to callers

use serde::de::DeserializeOwned;

use crate::{error::ApiError, request::Headers, Result};

/// Response as received from the transport
///
/// This is what response interceptors see, before any status inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON response with `content-type: application/json`
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    fn is_json(&self) -> bool {
        self.content_type().is_some_and(|ct| {
            let mime = ct.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
    }

    /// Decode a successful body by its declared content type
    ///
    /// Empty and `204` responses yield `None`, JSON content types are parsed,
    /// anything else is returned as text.
    pub(crate) fn payload(&self) -> Result<Option<serde_json::Value>> {
        if self.status == 204 || self.body.is_empty() {
            return Ok(None);
        }

        if self.is_json() {
            return serde_json::from_slice(&self.body).map(Some).map_err(|e| {
                ApiError::network("Failed to parse JSON response body", Some(Box::new(e)))
            });
        }

        Ok(Some(serde_json::Value::String(
            String::from_utf8_lossy(&self.body).into_owned(),
        )))
    }

    /// Decode an error body without ever failing
    pub(crate) fn error_body(&self) -> Option<serde_json::Value> {
        if self.body.is_empty() {
            return None;
        }

        if self.is_json() {
            if let Ok(value) = serde_json::from_slice(&self.body) {
                return Some(value);
            }
        }

        std::str::from_utf8(&self.body)
            .ok()
            .map(|text| serde_json::Value::String(text.to_string()))
    }
}

/// Response envelope returned by every client operation
///
/// Callers branch on the variant; client operations never fail outside it.
/// `Loading` is never produced by the client and exists so consumers can model
/// the state before a request starts.
#[derive(Debug)]
pub enum ApiResponse<T> {
    Success { data: T },
    Error { error: ApiError },
    Loading,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse::Success { data }
    }

    pub fn error(error: ApiError) -> Self {
        ApiResponse::Error { error }
    }

    pub fn loading() -> Self {
        ApiResponse::Loading
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ApiResponse::Error { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ApiResponse::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn error_ref(&self) -> Option<&ApiError> {
        match self {
            ApiResponse::Error { error } => Some(error),
            _ => None,
        }
    }

    /// Convert into a `Result`, `None` while still loading
    pub fn into_result(self) -> Option<Result<T>> {
        match self {
            ApiResponse::Success { data } => Some(Ok(data)),
            ApiResponse::Error { error } => Some(Err(error)),
            ApiResponse::Loading => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            ApiResponse::Success { data } => ApiResponse::Success { data: f(data) },
            ApiResponse::Error { error } => ApiResponse::Error { error },
            ApiResponse::Loading => ApiResponse::Loading,
        }
    }
}

impl<T> Default for ApiResponse<T> {
    fn default() -> Self {
        ApiResponse::Loading
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => ApiResponse::Success { data },
            Err(error) => ApiResponse::Error { error },
        }
    }
}

/// Convert a decoded payload into the caller's type
///
/// An empty payload decodes from JSON `null`, so `()`, `Option<_>` and
/// `serde_json::Value` all accept it.
pub(crate) fn decode_payload<T: DeserializeOwned>(payload: Option<serde_json::Value>) -> Result<T> {
    let value = payload.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(|e| {
        ApiError::network(
            format!("Failed to decode response payload: {e}"),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_payload_by_content_type() {
        let json_response = RawResponse::json(200, &json!({"id": 7}));
        assert_eq!(json_response.payload().unwrap(), Some(json!({"id": 7})));

        let vendor_json = RawResponse::new(200)
            .with_header("Content-Type", "application/vnd.api+json; charset=utf-8")
            .with_body(r#"[1,2]"#);
        assert_eq!(vendor_json.payload().unwrap(), Some(json!([1, 2])));

        let text = RawResponse::new(200)
            .with_header("content-type", "text/plain")
            .with_body("pong");
        assert_eq!(text.payload().unwrap(), Some(json!("pong")));
    }

    #[test]
    fn test_empty_and_no_content_payloads() {
        assert_eq!(RawResponse::new(200).payload().unwrap(), None);

        let no_content = RawResponse::new(204)
            .with_header("content-type", "application/json")
            .with_body("ignored");
        assert_eq!(no_content.payload().unwrap(), None);
    }

    #[test]
    fn test_malformed_json_payload_is_network_error() {
        let broken = RawResponse::new(200)
            .with_header("content-type", "application/json")
            .with_body("{not json");
        assert!(matches!(broken.payload(), Err(ApiError::Network { .. })));
    }

    #[test]
    fn test_error_body_is_best_effort() {
        let json_body = RawResponse::json(422, &json!({"field": "email"}));
        assert_eq!(json_body.error_body(), Some(json!({"field": "email"})));

        let broken = RawResponse::new(500)
            .with_header("content-type", "application/json")
            .with_body("<html>oops</html>");
        assert_eq!(broken.error_body(), Some(json!("<html>oops</html>")));

        let binary = RawResponse::new(500).with_body(vec![0xff, 0xfe]);
        assert_eq!(binary.error_body(), None);

        assert_eq!(RawResponse::new(502).error_body(), None);
    }

    #[test]
    fn test_decode_payload_into_types() {
        assert!(decode_payload::<()>(None).is_ok());

        let missing: Option<u32> = decode_payload(None).unwrap();
        assert_eq!(missing, None);

        let text: String = decode_payload(Some(json!("hi"))).unwrap();
        assert_eq!(text, "hi");

        let mismatch = decode_payload::<Vec<u32>>(Some(json!({"a": 1})));
        assert!(matches!(mismatch, Err(ApiError::Network { .. })));
    }

    #[test]
    fn test_envelope_accessors() {
        let ok: ApiResponse<u32> = ApiResponse::success(3);
        assert!(ok.is_success());
        assert_eq!(ok.data(), Some(&3));
        assert_eq!(ok.map(|n| n * 2).data(), Some(&6));

        let failed: ApiResponse<u32> = ApiResponse::error(ApiError::http(500, None));
        assert!(failed.is_error());
        assert_eq!(failed.error_ref().and_then(ApiError::status), Some(500));

        let loading: ApiResponse<u32> = ApiResponse::default();
        assert!(loading.is_loading());
        assert!(loading.into_result().is_none());
    }
}
