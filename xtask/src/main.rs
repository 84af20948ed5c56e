use anyhow::Result;
use clap::{Parser, Subcommand};
use mylie_buildinfo::properties::{self, RESOURCE_PATH};
use mylie_buildinfo::{BuildDescriptor, GitCli, Stamper, clock};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for mylie")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Stamp version.properties from the workspace's git state
    Stamp {
        /// Destination (default: target/resources/mylie/engine/version.properties)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Release build, then package the binary with the descriptor it embeds
    Dist,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_doc()?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Doc => run_doc()?,
        Commands::Build => run_build()?,
        Commands::Stamp { out } => {
            let out = out.unwrap_or_else(|| {
                workspace_root()
                    .join("target")
                    .join("resources")
                    .join(RESOURCE_PATH)
            });
            run_stamp(&out)?;
        }
        Commands::Dist => run_dist()?,
    }

    Ok(())
}

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn cargo(args: &[&str], what: &str) -> Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .current_dir(workspace_root())
        .status()?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    println!("==> Running cargo fmt --check");
    cargo(&["fmt", "--all", "--", "--check"], "cargo fmt check")
}

fn run_clippy() -> Result<()> {
    println!("==> Running cargo clippy");
    cargo(
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
        "cargo clippy",
    )
}

fn run_tests() -> Result<()> {
    println!("==> Running cargo test");
    cargo(&["test", "--workspace"], "cargo test")
}

fn run_doc() -> Result<()> {
    println!("==> Running cargo doc");
    cargo(&["doc", "--workspace", "--no-deps"], "cargo doc")
}

fn run_build() -> Result<()> {
    println!("==> Running cargo build");
    cargo(&["build", "--workspace"], "cargo build")
}

fn run_stamp(out: &Path) -> Result<()> {
    println!("==> Stamping {}", out.display());
    let git = GitCli::new(workspace_root());
    let descriptor =
        Stamper::new(env!("CARGO_PKG_VERSION")).stamp(&git, &clock::from_env(), out)?;
    println!("    {}", descriptor.summary());
    Ok(())
}

/// Build, then package. The shipped `version.properties` is the one the
/// release binary embedded at compile time, never a second stamp.
fn run_dist() -> Result<()> {
    println!("==> Running cargo build --release");
    cargo(&["build", "--release", "-p", "mylie-cli"], "cargo build --release")?;

    let root = workspace_root();
    let dist = root.join("target").join("dist");
    let binary = format!("mylie-cli{}", std::env::consts::EXE_SUFFIX);
    let built = root.join("target").join("release").join(&binary);

    let output = Command::new(&built).args(["info", "--raw"]).output()?;
    if !output.status.success() {
        anyhow::bail!("{} info --raw failed", built.display());
    }
    let descriptor = embedded_descriptor(&output.stdout)?;
    let resource = dist.join("resources").join(RESOURCE_PATH);
    println!("==> Writing {}", resource.display());
    properties::persist(&descriptor, &resource)?;
    println!("    {}", descriptor.summary());

    println!("==> Packaging {binary} into {}", dist.display());
    std::fs::copy(&built, dist.join(&binary))?;
    Ok(())
}

/// Parse the descriptor a binary printed with `info --raw`.
fn embedded_descriptor(stdout: &[u8]) -> Result<BuildDescriptor> {
    let text = std::str::from_utf8(stdout)?;
    Ok(BuildDescriptor::from_properties(&properties::parse(text)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMBEDDED: &str = "version=0.0.1\nlastTag=v1.2.0\ncommitDistance=5\n\
        commitHashShort=abc1234\ncommitHashFull=abc1234def5678901234567890abcdef12345678\n\
        branchName=main\nisCleanTag=false\nbuildTimestamp=01-01-2025 10:00\n";

    #[test]
    fn packaged_descriptor_matches_embedded_bytes() {
        let descriptor = embedded_descriptor(EMBEDDED.as_bytes()).unwrap();
        assert_eq!(descriptor.build_timestamp(), "01-01-2025 10:00");

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(RESOURCE_PATH);
        properties::persist(&descriptor, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), EMBEDDED);
    }

    #[test]
    fn incomplete_output_is_rejected() {
        assert!(embedded_descriptor(b"version=0.0.1\n").is_err());
    }
}
