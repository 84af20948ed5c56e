//! Engine build information.
//!
//! The build script stamps the engine's version and git state at compile
//! time; this crate embeds the resulting `version.properties` and exposes it
//! as a read-only [`BuildDescriptor`] plus log-header helpers.

mod logo;

pub use logo::{BANNER, log_banner};
pub use mylie_buildinfo::BuildDescriptor;

use mylie_buildinfo::{StampError, properties};
use std::sync::LazyLock;

/// The stamped property file, verbatim.
pub const VERSION_PROPERTIES: &str = include_str!(concat!(env!("OUT_DIR"), "/version.properties"));

/// One-line build identity computed by the build script.
pub const SUMMARY: &str = env!("MYLIE_BUILD_SUMMARY");

static BUILD: LazyLock<Result<BuildDescriptor, StampError>> = LazyLock::new(|| {
    let props = properties::parse(VERSION_PROPERTIES)?;
    BuildDescriptor::from_properties(&props)
});

/// Build information for this engine binary, parsed on first use.
pub fn build() -> Result<&'static BuildDescriptor, &'static StampError> {
    BUILD.as_ref()
}

/// Same as [`SUMMARY`].
pub fn summary() -> &'static str {
    SUMMARY
}

/// Log every build field, one line each.
pub fn log_build_info() {
    match build() {
        Ok(info) => {
            tracing::info!("Engine version: {}", info.version());
            tracing::info!("Last tag: {}", info.last_tag());
            tracing::info!("Commit distance: {}", info.commit_distance());
            tracing::info!("Commit hash: {}", info.commit_hash_short());
            tracing::info!("Commit hash full: {}", info.commit_hash_full());
            tracing::info!("Branch name: {}", info.branch_name());
            tracing::info!("Is clean tag: {}", info.is_clean_tag());
            tracing::info!("Build time: {}", info.build_timestamp());
        }
        Err(e) => tracing::error!("embedded build info is unreadable: {e}"),
    }
}
