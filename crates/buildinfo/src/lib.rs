//! Build metadata stamping: version control state + build time, persisted as
//! a flat `key=value` resource that ships inside the engine artifact.
//!
//! # Invariants
//! - Every descriptor field is populated. Unresolvable VCS facts become
//!   sentinels (`"unknown"`, `"local"`), never errors.
//! - Property files are written atomically; readers never see a partial file.
//! - Key order and sentinel strings are a versioned contract with readers.

pub mod clock;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod properties;
pub mod stamper;
pub mod vcs;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::StampConfig;
pub use descriptor::{
    BuildDescriptor, DEFAULT_TIMESTAMP_FORMAT, LOCAL_BRANCH, PROPERTY_KEYS, UNKNOWN,
};
pub use error::{StampError, VcsError};
pub use stamper::{Stamper, generate_descriptor};
pub use vcs::{GitCli, VersionControlQuery};
