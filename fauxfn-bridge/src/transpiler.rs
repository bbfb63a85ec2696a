//! External source-to-source compiler invocation

use std::path::Path;

use fauxfn_core::BridgeError;
use tokio::process::Command;
use tracing::{debug, info};

/// Configuration for the external compiler subprocess.
///
/// The compiler is a black box: it receives the source path as its final
/// argument, runs with the functions source directory as its working
/// directory (so project-relative config files are discovered there), and
/// emits the compiled code on stdout.
#[derive(Debug, Clone)]
pub struct Transpiler {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for Transpiler {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: vec![
                "babel".to_string(),
                "--presets".to_string(),
                "@babel/preset-env,@babel/preset-typescript".to_string(),
            ],
        }
    }
}

impl Transpiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Compile `source` and write the emitted code to `output`.
    ///
    /// The output file is created or overwritten in place; there is no
    /// atomic replace, so a crash mid-write can leave a truncated output
    /// until the next staleness-triggered recompile.
    pub async fn transpile(
        &self,
        source_root: &Path,
        source: &Path,
        output: &Path,
    ) -> Result<(), BridgeError> {
        info!(source = %source.display(), "Compiling function module");

        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(source)
            .current_dir(source_root)
            .output()
            .await
            .map_err(|e| BridgeError::Transpile {
                path: source.display().to_string(),
                message: format!("failed to run {}: {e}", self.program),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(BridgeError::Transpile {
                path: source.display().to_string(),
                message: stderr.trim().to_string(),
            });
        }

        debug!(
            output = %output.display(),
            bytes = result.stdout.len(),
            "Writing compiled module"
        );
        tokio::fs::write(output, &result.stdout).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(path: &Path, body: &str) {
        fs::write(path, body).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn test_transpile_writes_compiler_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = dir.path().join("compiler.sh");
        write_script(&compiler, "#!/bin/sh\ncat \"$1\"\n");

        let source = dir.path().join("hello.js");
        fs::write(&source, "compiled form").unwrap();
        let output = dir.path().join("hello.out.js");

        let transpiler = Transpiler::new(compiler.display().to_string(), vec![]);
        transpiler
            .transpile(dir.path(), &source, &output)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "compiled form");
    }

    #[tokio::test]
    async fn test_transpile_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = dir.path().join("compiler.sh");
        write_script(&compiler, "#!/bin/sh\necho 'SyntaxError: bad input' >&2\nexit 1\n");

        let source = dir.path().join("broken.ts");
        fs::write(&source, "oops").unwrap();
        let output = dir.path().join("broken.js");

        let transpiler = Transpiler::new(compiler.display().to_string(), vec![]);
        let err = transpiler
            .transpile(dir.path(), &source, &output)
            .await
            .unwrap_err();

        match err {
            BridgeError::Transpile { path, message } => {
                assert!(path.contains("broken.ts"));
                assert!(message.contains("SyntaxError"));
            }
            other => panic!("expected transpile error, got {other:?}"),
        }
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_compiler_program() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("f.js");
        fs::write(&source, "x").unwrap();

        let transpiler = Transpiler::new("/nonexistent/compiler", vec![]);
        let err = transpiler
            .transpile(dir.path(), &source, dir.path().join("f.out.js").as_path())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Transpile { .. }));
    }
}
