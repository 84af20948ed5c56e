//! Stamps `version.properties` into `OUT_DIR` so the library can embed it.

use mylie_buildinfo::{GitCli, Stamper, clock};
use std::env;
use std::path::PathBuf;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), BoxError> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let version = env::var("CARGO_PKG_VERSION")?;

    let git = GitCli::new(&manifest_dir);
    let descriptor = Stamper::new(version).stamp(
        &git,
        &clock::from_env(),
        out_dir.join("version.properties"),
    )?;
    println!(
        "cargo:rustc-env=MYLIE_BUILD_SUMMARY={}",
        descriptor.summary().replace('\n', " ")
    );

    // Re-stamp on source edits and on any commit, checkout or tag.
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed={}", clock::SOURCE_DATE_EPOCH);
    match git.git_dir() {
        Ok(git_dir) => {
            for entry in ["HEAD", "index", "refs", "packed-refs"] {
                println!("cargo:rerun-if-changed={}", git_dir.join(entry).display());
            }
        }
        Err(e) => println!("cargo:warning=no git metadata, stamping sentinels: {e}"),
    }
    Ok(())
}
