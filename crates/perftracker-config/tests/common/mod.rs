// perftracker-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for perftracker-config integration tests.
// Purpose: Write config files into temporary directories and check errors.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::PathBuf;

use perftracker_config::ConfigError;
use tempfile::TempDir;

/// Result type used by config tests.
pub type TestResult = Result<(), String>;

/// Writes `content` to `perftracker.toml` in a fresh temp directory.
pub fn write_config(content: &str) -> Result<(TempDir, PathBuf), String> {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("perftracker.toml");
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok((dir, path))
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
