//! Invocation event and result models
//!
//! These mirror the serverless platform contract: the event handed to a
//! handler and the result it produces are camelCase JSON values, with
//! non-textual bodies carried base64-encoded.

use std::collections::HashMap;

use axum::http::{header, HeaderMap, Method};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Synthetic request event passed to a function handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub path: String,
    pub http_method: String,
    pub query_string_parameters: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

/// Response produced by a function handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResult {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl FunctionEvent {
    /// Build an event from the pieces of an incoming HTTP request.
    ///
    /// A body is base64-encoded unless the `Content-Type` header marks it as
    /// a textual or application subtype; unknown and absent content types
    /// are treated as binary so the payload survives transport verbatim.
    pub fn from_request(
        path: &str,
        method: &Method,
        query: Option<&str>,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Self {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let is_base64 = !body.is_empty() && !is_textual(content_type);

        let body = if body.is_empty() {
            None
        } else if is_base64 {
            Some(BASE64.encode(body))
        } else {
            Some(String::from_utf8_lossy(body).into_owned())
        };

        let headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            path: path.to_string(),
            http_method: method.as_str().to_string(),
            query_string_parameters: parse_query(query),
            headers,
            body,
            is_base64_encoded: is_base64,
        }
    }
}

impl FunctionResult {
    /// Response body as raw bytes, base64-decoded when the result flags it.
    pub fn decoded_body(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match &self.body {
            Some(body) if self.is_base64_encoded => BASE64.decode(body),
            Some(body) => Ok(body.clone().into_bytes()),
            None => Ok(Vec::new()),
        }
    }
}

/// Query string as a single-valued map; a repeated key keeps the last value.
fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let Some(query) = query else {
        return HashMap::new();
    };
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn is_textual(content_type: &str) -> bool {
    content_type.contains("text") || content_type.contains("application")
}
