use crate::error::StampError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel for tag and hash fields that could not be resolved.
pub const UNKNOWN: &str = "unknown";

/// Sentinel branch name for detached HEAD or no repository.
pub const LOCAL_BRANCH: &str = "local";

/// `dd-MM-yyyy hh:mm`, 12-hour clock without meridiem.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d-%m-%Y %I:%M";

/// Property keys in persisted order.
pub const PROPERTY_KEYS: [&str; 8] = [
    "version",
    "lastTag",
    "commitDistance",
    "commitHashShort",
    "commitHashFull",
    "branchName",
    "isCleanTag",
    "buildTimestamp",
];

/// Version control and timing facts captured once per build.
///
/// Fields are private: a descriptor comes either from
/// [`Stamper::generate`](crate::Stamper::generate) or from parsing a
/// persisted property file, and is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDescriptor {
    pub(crate) version: String,
    pub(crate) last_tag: String,
    pub(crate) commit_distance: u32,
    pub(crate) commit_hash_short: String,
    pub(crate) commit_hash_full: String,
    pub(crate) branch_name: String,
    pub(crate) is_clean_tag: bool,
    pub(crate) build_timestamp: String,
}

impl BuildDescriptor {
    /// Project version identifier.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Most recent tag reachable from HEAD, or [`UNKNOWN`].
    pub fn last_tag(&self) -> &str {
        &self.last_tag
    }

    /// Commits between [`last_tag`](Self::last_tag) and HEAD.
    pub fn commit_distance(&self) -> u32 {
        self.commit_distance
    }

    pub fn commit_hash_short(&self) -> &str {
        &self.commit_hash_short
    }

    pub fn commit_hash_full(&self) -> &str {
        &self.commit_hash_full
    }

    /// Current branch, or [`LOCAL_BRANCH`].
    pub fn branch_name(&self) -> &str {
        &self.branch_name
    }

    /// HEAD is exactly the last tag and the working tree has no changes.
    pub fn is_clean_tag(&self) -> bool {
        self.is_clean_tag
    }

    pub fn build_timestamp(&self) -> &str {
        &self.build_timestamp
    }

    /// Field values paired with their property keys, in persisted order.
    pub fn entries(&self) -> [(&'static str, String); 8] {
        [
            (PROPERTY_KEYS[0], self.version.clone()),
            (PROPERTY_KEYS[1], self.last_tag.clone()),
            (PROPERTY_KEYS[2], self.commit_distance.to_string()),
            (PROPERTY_KEYS[3], self.commit_hash_short.clone()),
            (PROPERTY_KEYS[4], self.commit_hash_full.clone()),
            (PROPERTY_KEYS[5], self.branch_name.clone()),
            (PROPERTY_KEYS[6], self.is_clean_tag.to_string()),
            (PROPERTY_KEYS[7], self.build_timestamp.clone()),
        ]
    }

    /// Rebuild a descriptor from a parsed property map.
    ///
    /// Unknown keys are ignored so newer writers stay readable.
    pub fn from_properties(props: &BTreeMap<String, String>) -> Result<Self, StampError> {
        let get = |key: &'static str| -> Result<String, StampError> {
            props.get(key).cloned().ok_or(StampError::MissingKey(key))
        };

        let distance = get("commitDistance")?;
        let commit_distance = distance
            .parse::<u32>()
            .map_err(|_| StampError::InvalidValue {
                key: "commitDistance",
                value: distance.clone(),
            })?;

        let clean = get("isCleanTag")?;
        let is_clean_tag = match clean.as_str() {
            "true" => true,
            "false" => false,
            _ => {
                return Err(StampError::InvalidValue {
                    key: "isCleanTag",
                    value: clean,
                });
            }
        };

        Ok(Self {
            version: get("version")?,
            last_tag: get("lastTag")?,
            commit_distance,
            commit_hash_short: get("commitHashShort")?,
            commit_hash_full: get("commitHashFull")?,
            branch_name: get("branchName")?,
            is_clean_tag,
            build_timestamp: get("buildTimestamp")?,
        })
    }

    /// One-line identity for log headers and `--version` style output.
    pub fn summary(&self) -> String {
        let tag = if self.is_clean_tag {
            self.last_tag.clone()
        } else {
            format!("{}+{}", self.last_tag, self.commit_distance)
        };
        format!(
            "{} ({} {} on {}, built {})",
            self.version, tag, self.commit_hash_short, self.branch_name, self.build_timestamp
        )
    }
}

#[cfg(test)]
pub(crate) fn sample() -> BuildDescriptor {
    BuildDescriptor {
        version: "0.0.1".into(),
        last_tag: "v1.2.0".into(),
        commit_distance: 5,
        commit_hash_short: "abc1234".into(),
        commit_hash_full: "abc1234def5678901234567890abcdef12345678".into(),
        branch_name: "main".into(),
        is_clean_tag: false,
        build_timestamp: "01-01-2025 10:00".into(),
    }
}
