//! Source file resolution and staleness checking

use std::io;
use std::path::{Path, PathBuf};

/// Recognized source extensions, in priority order. First match wins.
pub const DEFAULT_EXTENSIONS: [&str; 6] = [".es6", ".es", ".js", ".mjs", ".ts", ".tsx"];

/// Extension of every compiled output file.
pub const OUTPUT_EXTENSION: &str = ".js";

/// Locate the source file for a logical function name.
///
/// Tries `directory/name<ext>` for each extension in order and returns the
/// first path that exists. Absence is a recoverable condition for callers,
/// not an error.
pub fn resolve(directory: &Path, name: &str, extensions: &[String]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| directory.join(format!("{name}{ext}")))
        .find(|candidate| candidate.exists())
}

/// Whether `source` was modified strictly later than `output`.
///
/// Both files must exist; callers treat a missing output as "needs compile"
/// before ever calling this. Mtime comparison only, no content hashing, so
/// a rolled-back source with an older mtime will not be detected as changed.
pub fn is_stale(source: &Path, output: &Path) -> io::Result<bool> {
    let source_mtime = std::fs::metadata(source)?.modified()?;
    let output_mtime = std::fs::metadata(output)?.modified()?;
    Ok(source_mtime > output_mtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};

    fn default_extensions() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    #[test]
    fn test_resolve_picks_first_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.ts"), "ts").unwrap();
        fs::write(dir.path().join("hello.js"), "js").unwrap();

        // ".js" is listed before ".ts", so it must win.
        let resolved = resolve(dir.path(), "hello", &default_extensions()).unwrap();
        assert_eq!(resolved, dir.path().join("hello.js"));
    }

    #[test]
    fn test_resolve_falls_through_to_later_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("typed.tsx"), "tsx").unwrap();

        let resolved = resolve(dir.path(), "typed", &default_extensions()).unwrap();
        assert_eq!(resolved, dir.path().join("typed.tsx"));
    }

    #[test]
    fn test_resolve_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve(dir.path(), "missing", &default_extensions()).is_none());
    }

    #[test]
    fn test_is_stale_when_source_newer() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("f.js");
        let output = dir.path().join("out.js");
        fs::write(&source, "a").unwrap();
        fs::write(&output, "b").unwrap();

        let now = SystemTime::now();
        set_mtime(&output, now);
        set_mtime(&source, now + Duration::from_secs(5));
        assert!(is_stale(&source, &output).unwrap());
    }

    #[test]
    fn test_is_not_stale_when_mtimes_equal_or_older() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("f.js");
        let output = dir.path().join("out.js");
        fs::write(&source, "a").unwrap();
        fs::write(&output, "b").unwrap();

        let now = SystemTime::now();
        set_mtime(&source, now);
        set_mtime(&output, now);
        assert!(!is_stale(&source, &output).unwrap());

        set_mtime(&output, now + Duration::from_secs(5));
        assert!(!is_stale(&source, &output).unwrap());
    }
}
