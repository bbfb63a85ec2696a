//! Function invocation bridge for fauxfn
//!
//! Resolves function source files, transpiles them on demand, and invokes
//! the compiled handlers in response to HTTP requests.

pub mod event;
pub mod handlers;
pub mod loader;
pub mod resolver;
pub mod service;
pub mod transpiler;

pub use event::{FunctionEvent, FunctionResult};
pub use service::{FunctionService, ServiceConfig};
pub use transpiler::Transpiler;
