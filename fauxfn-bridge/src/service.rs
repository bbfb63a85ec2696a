//! Function bridge service
//!
//! Ties resolution, staleness checking, transpilation and module loading
//! together. Each request runs the full pipeline independently: there is no
//! cross-request coordination, so two concurrent requests for the same stale
//! function may both transpile it (last writer wins on the output file).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fauxfn_core::BridgeError;
use tracing::{debug, info};

use crate::event::{FunctionEvent, FunctionResult};
use crate::loader::{LoadedModule, ModuleCache};
use crate::resolver::{self, DEFAULT_EXTENSIONS, OUTPUT_EXTENSION};
use crate::transpiler::Transpiler;

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding function source files. Must exist.
    pub functions_src: PathBuf,
    /// Directory for compiled output files. Created if missing.
    pub functions_output: PathBuf,
    /// Recognized source extensions, in priority order.
    pub extensions: Vec<String>,
    /// Program used to execute compiled handlers.
    pub runtime_program: String,
    /// External compiler invocation.
    pub transpiler: Transpiler,
}

impl ServiceConfig {
    pub fn new(functions_src: PathBuf, functions_output: PathBuf) -> Self {
        Self {
            functions_src,
            functions_output,
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            runtime_program: "node".to_string(),
            transpiler: Transpiler::default(),
        }
    }

    /// Validate the configuration and create the output directory.
    ///
    /// A missing source directory is fatal; the output directory is created
    /// on demand.
    pub fn prepare(&self) -> Result<(), BridgeError> {
        if !self.functions_src.is_dir() {
            return Err(BridgeError::Configuration(format!(
                "functions source directory does not exist: {}",
                self.functions_src.display()
            )));
        }
        std::fs::create_dir_all(&self.functions_output)?;
        Ok(())
    }
}

/// The invocation bridge service.
pub struct FunctionService {
    config: ServiceConfig,
    modules: ModuleCache,
}

impl FunctionService {
    pub fn new(config: ServiceConfig) -> Self {
        let modules = ModuleCache::new(config.runtime_program.clone());
        Self { config, modules }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.config
            .functions_output
            .join(format!("{name}{OUTPUT_EXTENSION}"))
    }

    /// Resolve, recompile if needed, and freshly load the named module.
    async fn prepare_module(&self, name: &str) -> Result<Arc<LoadedModule>, BridgeError> {
        let source = resolver::resolve(&self.config.functions_src, name, &self.config.extensions)
            .ok_or(BridgeError::ModuleNotFound)?;
        let output = self.output_path(name);

        if !output.exists() || resolver::is_stale(&source, &output)? {
            self.config
                .transpiler
                .transpile(&self.config.functions_src, &source, &output)
                .await?;
        } else {
            debug!(function = %name, "Compiled output is fresh");
        }

        // Always reload so edits take effect without a restart.
        self.modules.invalidate(&output);
        self.modules.load(&output)
    }

    /// Invoke the named function with the given event.
    pub async fn invoke(
        &self,
        name: &str,
        event: &FunctionEvent,
    ) -> Result<FunctionResult, BridgeError> {
        let module = self.prepare_module(name).await?;
        module.invoke(event).await
    }

    /// Transpile every matching source file unconditionally.
    ///
    /// This is the full-build path: no staleness check, no resolver, just a
    /// flat directory walk with one transpile per matching file.
    pub async fn build_all(&self) -> Result<usize, BridgeError> {
        let mut entries = tokio::fs::read_dir(&self.config.functions_src).await?;
        let mut compiled = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(stem) = self.matching_stem(file_name) else {
                continue;
            };

            let output = self.output_path(stem);
            self.config
                .transpiler
                .transpile(&self.config.functions_src, &path, &output)
                .await?;
            compiled += 1;
        }

        info!(count = compiled, "Compiled function modules");
        Ok(compiled)
    }

    /// Logical name of `file_name` if it carries a recognized extension.
    fn matching_stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.config
            .extensions
            .iter()
            .find(|ext| file_name.len() > ext.len() && file_name.ends_with(ext.as_str()))
            .map(|ext| &file_name[..file_name.len() - ext.len()])
    }
}
