//! HTTP handler for the invocation bridge

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use fauxfn_core::{invocation_failure_body, BridgeError};
use tracing::{error, info};

use crate::event::{FunctionEvent, FunctionResult};
use crate::service::FunctionService;

/// Handle one request under the functions prefix.
///
/// `function` is the wildcard remainder after the prefix; the logical name
/// is that segment with any trailing slash trimmed.
pub async fn handle_invocation(
    State(service): State<Arc<FunctionService>>,
    Path(function): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let name = function.trim_end_matches('/').to_string();
    info!(function = %name, method = %method, "Function invocation");

    let path = format!("/{function}");
    let event = FunctionEvent::from_request(&path, &method, uri.query(), &headers, &body);

    match service.invoke(&name, &event).await {
        Ok(result) => result_response(&result).unwrap_or_else(|err| {
            error!(function = %name, error = %err, "Error during invocation");
            failure_response(&err)
        }),
        Err(err) => {
            error!(function = %name, error = %err, "Error during invocation");
            failure_response(&err)
        }
    }
}

/// Translate a handler result into the outgoing HTTP response.
fn result_response(result: &FunctionResult) -> Result<Response, BridgeError> {
    let status = StatusCode::from_u16(result.status_code)
        .map_err(|_| BridgeError::Handler(format!("invalid status code {}", result.status_code)))?;

    let mut builder = Response::builder().status(status);
    for (name, value) in &result.headers {
        builder = builder.header(name, value);
    }

    let body = result
        .decoded_body()
        .map_err(|e| BridgeError::Handler(format!("invalid base64 body: {e}")))?;

    builder
        .body(Body::from(body))
        .map_err(|e| BridgeError::Handler(e.to_string()))
}

/// All failure kinds share one wire shape: 500 plus the fixed-prefix body.
fn failure_response(err: &BridgeError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        invocation_failure_body(err),
    )
        .into_response()
}
