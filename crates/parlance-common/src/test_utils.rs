//! Test utilities and shared fixtures for the Parlance workspace.
//!
//! Enabled for dependents through the `testing` feature.

use std::fs;
use std::path::Path;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Write a locale file below `root`, creating parent directories as needed.
pub fn write_locale_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create locale directory");
    }
    fs::write(&path, contents).expect("Failed to write locale file");
}

/// Locale fixtures in the flat JSON layout.
pub mod locale_fixtures {
    /// English messages covering plain, templated and pluralised entries.
    pub fn english_json() -> &'static str {
        r#"{
  "WELCOME": "Hello",
  "HELLO_USER": "Hello, {{.name}}!",
  "SUCCESS": "Success",
  "USER_NOT_FOUND": "User {{.id}} was not found",
  "UNREAD_MESSAGES": {
    "one": "You have {{.Count}} unread message",
    "other": "You have {{.Count}} unread messages"
  }
}"#
    }

    /// Simplified Chinese messages; deliberately missing `WELCOME`.
    pub fn simplified_chinese_json() -> &'static str {
        r#"{
  "HELLO_USER": "你好，{{.name}}！",
  "SUCCESS": "成功",
  "UNREAD_MESSAGES": {
    "other": "您有 {{.Count}} 条未读消息"
  }
}"#
    }
}
