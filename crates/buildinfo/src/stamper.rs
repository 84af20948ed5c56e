//! Descriptor generation with field-level fallback.

use crate::clock::Clock;
use crate::config::StampConfig;
use crate::descriptor::{BuildDescriptor, DEFAULT_TIMESTAMP_FORMAT, LOCAL_BRANCH, UNKNOWN};
use crate::error::{StampError, VcsError};
use crate::properties;
use crate::vcs::VersionControlQuery;
use std::path::Path;

/// Produces build descriptors for one project version.
#[derive(Debug, Clone)]
pub struct Stamper {
    version: String,
    timestamp_format: String,
}

impl Stamper {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    /// Stamper for `config.version`, or `fallback_version` when the config
    /// does not name one.
    pub fn from_config(config: &StampConfig, fallback_version: &str) -> Self {
        let version = config.version.as_deref().unwrap_or(fallback_version);
        Self::new(version).with_timestamp_format(config.timestamp_format.clone())
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Build a fully populated descriptor. Never fails: each unresolved VCS
    /// fact becomes its sentinel.
    pub fn generate(&self, vcs: &impl VersionControlQuery, clock: &impl Clock) -> BuildDescriptor {
        let last_tag = or_sentinel("lastTag", vcs.last_tag(), UNKNOWN);
        let tagged = last_tag != UNKNOWN;

        let commit_distance = if tagged {
            resolve("commitDistance", vcs.commit_distance()).unwrap_or(0)
        } else {
            0
        };
        let is_clean_tag = tagged && resolve("isCleanTag", vcs.is_clean_tag()).unwrap_or(false);

        let version = if self.version.trim().is_empty() {
            UNKNOWN.to_string()
        } else {
            self.version.clone()
        };

        BuildDescriptor {
            version,
            last_tag,
            commit_distance,
            commit_hash_short: or_sentinel("commitHashShort", vcs.commit_hash_short(), UNKNOWN),
            commit_hash_full: or_sentinel("commitHashFull", vcs.commit_hash_full(), UNKNOWN),
            branch_name: or_sentinel("branchName", vcs.branch_name(), LOCAL_BRANCH),
            is_clean_tag,
            build_timestamp: self.timestamp(clock),
        }
    }

    /// Generate a descriptor and persist it at `destination`.
    pub fn stamp(
        &self,
        vcs: &impl VersionControlQuery,
        clock: &impl Clock,
        destination: impl AsRef<Path>,
    ) -> Result<BuildDescriptor, StampError> {
        let descriptor = self.generate(vcs, clock);
        properties::persist(&descriptor, destination)?;
        Ok(descriptor)
    }

    fn timestamp(&self, clock: &impl Clock) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let formatted = clock.now().format(&self.timestamp_format);
        if write!(out, "{formatted}").is_err() || out.is_empty() {
            tracing::warn!(
                format = %self.timestamp_format,
                "unusable timestamp format, using default"
            );
            out = clock.now().format(DEFAULT_TIMESTAMP_FORMAT).to_string();
        }
        out
    }
}

/// Descriptor for `version` with the default timestamp format.
pub fn generate_descriptor(
    version: &str,
    vcs: &impl VersionControlQuery,
    clock: &impl Clock,
) -> BuildDescriptor {
    Stamper::new(version).generate(vcs, clock)
}

fn resolve<T>(field: &'static str, result: Result<T, VcsError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(field, %error, "version control query failed, using sentinel");
            None
        }
    }
}

fn or_sentinel(field: &'static str, result: Result<String, VcsError>, sentinel: &str) -> String {
    match resolve(field, result) {
        Some(value) if !value.trim().is_empty() => value,
        Some(_) => {
            tracing::warn!(field, "version control query returned nothing, using sentinel");
            sentinel.to_string()
        }
        None => sentinel.to_string(),
    }
}
