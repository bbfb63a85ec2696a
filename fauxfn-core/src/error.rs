//! Error types and wire formatting
//!
//! Every runtime failure of the bridge shares one user-visible shape: HTTP
//! 500 with a plain-text body produced by [`invocation_failure_body`]. The
//! kinds below are only distinguishable in server-side logs.

use std::fmt::Display;

use thiserror::Error;

/// Failure kinds for the function bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Invalid startup configuration. Fatal; never reaches the wire.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No source file resolves for the requested logical name.
    #[error("Module not found")]
    ModuleNotFound,

    /// The external compiler rejected the source file.
    #[error("transpile failed for {path}: {message}")]
    Transpile { path: String, message: String },

    /// The compiled output failed to load at require-time.
    #[error("{0}")]
    Load(String),

    /// The handler reported failure through its completion channel.
    #[error("{0}")]
    Handler(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Plain-text response body for a failed invocation.
///
/// The fixed prefix is part of the emulated platform contract.
pub fn invocation_failure_body(err: &impl Display) -> String {
    format!("Function invocation failed: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_body_prefix() {
        let body = invocation_failure_body(&BridgeError::ModuleNotFound);
        assert_eq!(body, "Function invocation failed: Module not found");
    }

    #[test]
    fn test_transpile_error_names_source() {
        let err = BridgeError::Transpile {
            path: "functions/hello.ts".to_string(),
            message: "unexpected token".to_string(),
        };
        let body = invocation_failure_body(&err);
        assert!(body.starts_with("Function invocation failed: "));
        assert!(body.contains("functions/hello.ts"));
    }
}
