//! Compiled module loading and handler invocation
//!
//! Loaded modules are tracked in an explicit keyed cache (output path →
//! module handle) that is invalidated before every reload, so the executed
//! code always reflects the most recent transpile. A load is realized as a
//! fresh runtime subprocess per invocation; the repeated initialization cost
//! is the price of edit-and-reload without a server restart.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use fauxfn_core::BridgeError;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::event::{FunctionEvent, FunctionResult};

/// Driver script executed by the runtime subprocess.
///
/// It requires the compiled module with a cleared require cache, then calls
/// `handler(event, {}, callback)`. Both the callback and a returned thenable
/// feed one settle guard; only the first completion is honored. Exactly one
/// completion record is written to stdout before the process exits.
const INVOKE_SHIM: &str = r#"
const modulePath = process.env.FAUXFN_MODULE;
const chunks = [];
process.stdin.on('data', (c) => chunks.push(c));
process.stdin.on('end', () => {
  const event = JSON.parse(Buffer.concat(chunks).toString('utf8'));
  let settled = false;
  const settle = (record) => {
    if (settled) return;
    settled = true;
    process.stdout.write(JSON.stringify(record) + '\n', () => process.exit(0));
  };
  let mod;
  try {
    delete require.cache[require.resolve(modulePath)];
    mod = require(modulePath);
  } catch (err) {
    settle({ kind: 'load_error', error: String(err) });
    return;
  }
  const handler = mod.handler || (mod.default && mod.default.handler);
  if (typeof handler !== 'function') {
    settle({ kind: 'load_error', error: 'Error: module does not export a handler' });
    return;
  }
  const callback = (err, result) => {
    if (err) settle({ kind: 'handler_error', error: String(err) });
    else settle({ kind: 'result', value: result });
  };
  let returned;
  try {
    returned = handler(event, {}, callback);
  } catch (err) {
    settle({ kind: 'handler_error', error: String(err) });
    return;
  }
  if (returned && typeof returned.then === 'function') {
    returned.then((value) => callback(null, value), (err) => callback(err, null));
  }
});
"#;

/// Single completion record emitted by the invoke shim.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum InvokeRecord {
    Result { value: FunctionResult },
    LoadError { error: String },
    HandlerError { error: String },
}

/// Handle to a loaded compiled module.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    path: PathBuf,
    runtime_program: String,
}

/// Keyed cache of loaded modules.
pub struct ModuleCache {
    modules: DashMap<PathBuf, Arc<LoadedModule>>,
    runtime_program: String,
}

impl ModuleCache {
    pub fn new(runtime_program: impl Into<String>) -> Self {
        Self {
            modules: DashMap::new(),
            runtime_program: runtime_program.into(),
        }
    }

    /// Drop any cached handle for `path`. The next load starts fresh.
    pub fn invalidate(&self, path: &Path) {
        if self.modules.remove(path).is_some() {
            debug!(module = %path.display(), "Invalidated cached module");
        }
    }

    /// Load the compiled module at `path` and cache the handle.
    pub fn load(&self, path: &Path) -> Result<Arc<LoadedModule>, BridgeError> {
        std::fs::metadata(path)
            .map_err(|e| BridgeError::Load(format!("cannot load {}: {e}", path.display())))?;

        let module = Arc::new(LoadedModule {
            path: path.to_path_buf(),
            runtime_program: self.runtime_program.clone(),
        });
        self.modules.insert(path.to_path_buf(), module.clone());
        Ok(module)
    }

    #[cfg(test)]
    fn contains(&self, path: &Path) -> bool {
        self.modules.contains_key(path)
    }
}

impl LoadedModule {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Invoke the module's exported handler with the given event.
    ///
    /// The event is fed to the runtime subprocess on stdin; the last stdout
    /// line is the completion record, earlier lines are function logs.
    pub async fn invoke(&self, event: &FunctionEvent) -> Result<FunctionResult, BridgeError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| BridgeError::Handler(format!("cannot encode event: {e}")))?;

        let mut child = Command::new(&self.runtime_program)
            .arg("-e")
            .arg(INVOKE_SHIM)
            .env("FAUXFN_MODULE", &self.path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| {
                BridgeError::Load(format!("failed to start {}: {e}", self.runtime_program))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // The handler may settle before reading its input; a broken pipe
            // here is not an invocation failure.
            let _ = stdin.write_all(&payload).await;
        }

        let output = child.wait_with_output().await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!(module = %self.path.display(), "{line}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines().filter(|l| !l.trim().is_empty());
        let record_line = lines.next_back();
        for line in lines {
            debug!(module = %self.path.display(), "{line}");
        }

        let Some(record_line) = record_line else {
            return Err(BridgeError::Handler(format!(
                "handler produced no completion record: {}",
                stderr.trim()
            )));
        };

        match serde_json::from_str::<InvokeRecord>(record_line) {
            Ok(InvokeRecord::Result { value }) => Ok(value),
            Ok(InvokeRecord::LoadError { error }) => Err(BridgeError::Load(error)),
            Ok(InvokeRecord::HandlerError { error }) => Err(BridgeError::Handler(error)),
            Err(_) => Err(BridgeError::Handler(format!(
                "unrecognized handler output: {record_line}"
            ))),
        }
    }
}
