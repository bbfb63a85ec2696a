//! Core types shared across fauxfn crates

pub mod error;

pub use error::{invocation_failure_body, BridgeError};
