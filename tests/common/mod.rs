//! Common helpers for the integration test suite

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use readme_translator::{Result, TranslationError, TranslatorConfig, VersionControl};
use tempfile::TempDir;

pub const SOURCE: &str = "# Title\n\nHello\n\n## Sub\n\nWorld\n";

/// A version-control double that hands back a fixed diff, or fails
pub struct CannedDiff(pub Option<String>);

impl CannedDiff {
    pub fn diff(text: &str) -> Self {
        Self(Some(text.to_string()))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl VersionControl for CannedDiff {
    fn diff_zero_context(&self, _path: &Path) -> Result<String> {
        self.0
            .clone()
            .ok_or_else(|| TranslationError::Diff("fatal: not a git repository".to_string()))
    }
}

pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write test file");
    path
}

pub fn read_file(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).expect("read test file")
}

pub fn config() -> TranslatorConfig {
    TranslatorConfig::default()
}
