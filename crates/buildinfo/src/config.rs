//! Stamp configuration, optionally loaded from YAML.
//!
//! ```yaml
//! version: 0.0.1
//! repo_dir: .
//! destination: target/resources/mylie/engine/version.properties
//! timestamp_format: "%d-%m-%Y %I:%M"
//! hash_length: 7
//! git_program: git
//! ```

use crate::descriptor::DEFAULT_TIMESTAMP_FORMAT;
use crate::error::StampError;
use crate::properties::RESOURCE_PATH;
use crate::vcs::{DEFAULT_HASH_LENGTH, GitCli};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StampConfig {
    /// Project version. `None` leaves it to the caller (usually the crate version).
    pub version: Option<String>,
    pub repo_dir: PathBuf,
    pub destination: PathBuf,
    /// chrono format string for `buildTimestamp`.
    pub timestamp_format: String,
    pub hash_length: usize,
    pub git_program: String,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            version: None,
            repo_dir: PathBuf::from("."),
            destination: Path::new("target").join("resources").join(RESOURCE_PATH),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            hash_length: DEFAULT_HASH_LENGTH,
            git_program: "git".to_string(),
        }
    }
}

impl StampConfig {
    pub fn from_yaml(text: &str) -> Result<Self, StampError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StampError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    /// Git query configured from this stamp config.
    pub fn git(&self) -> GitCli {
        GitCli::new(&self.repo_dir)
            .with_program(self.git_program.clone())
            .with_hash_length(self.hash_length)
    }
}
