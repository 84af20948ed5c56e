//! Version-control queries.
//!
//! [`VersionControlQuery`] exposes one method per fact so that a failure in
//! one does not hide the others. [`GitCli`] answers them by running the `git`
//! executable against a working tree.

use crate::error::VcsError;
use std::cell::OnceCell;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Repository state needed for a build descriptor.
pub trait VersionControlQuery {
    /// Most recent tag reachable from HEAD.
    fn last_tag(&self) -> Result<String, VcsError>;
    /// Commits since [`last_tag`](Self::last_tag).
    fn commit_distance(&self) -> Result<u32, VcsError>;
    fn commit_hash_short(&self) -> Result<String, VcsError>;
    fn commit_hash_full(&self) -> Result<String, VcsError>;
    /// Checked-out branch. Fails for a detached HEAD.
    fn branch_name(&self) -> Result<String, VcsError>;
    /// HEAD is exactly the last tag and tracked files are unmodified.
    fn is_clean_tag(&self) -> Result<bool, VcsError>;
}

impl<Q: VersionControlQuery + ?Sized> VersionControlQuery for &Q {
    fn last_tag(&self) -> Result<String, VcsError> {
        (**self).last_tag()
    }
    fn commit_distance(&self) -> Result<u32, VcsError> {
        (**self).commit_distance()
    }
    fn commit_hash_short(&self) -> Result<String, VcsError> {
        (**self).commit_hash_short()
    }
    fn commit_hash_full(&self) -> Result<String, VcsError> {
        (**self).commit_hash_full()
    }
    fn branch_name(&self) -> Result<String, VcsError> {
        (**self).branch_name()
    }
    fn is_clean_tag(&self) -> Result<bool, VcsError> {
        (**self).is_clean_tag()
    }
}

/// Default abbreviation length for short hashes.
pub const DEFAULT_HASH_LENGTH: usize = 7;

/// Shortest abbreviation git accepts.
pub const MIN_HASH_LENGTH: usize = 4;

/// Parsed `git describe --tags --long` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub tag: String,
    pub distance: u32,
}

impl Description {
    /// Parse `<tag>-<distance>-g<hash>`. The tag itself may contain `-`.
    pub fn parse(line: &str) -> Result<Self, VcsError> {
        let line = line.trim();
        let mut parts = line.rsplitn(3, '-');
        let (Some(hash), Some(distance), Some(tag)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(VcsError::Parse(line.to_string()));
        };
        if hash.strip_prefix('g').is_none_or(str::is_empty) {
            return Err(VcsError::Parse(line.to_string()));
        }
        let distance = distance
            .parse::<u32>()
            .map_err(|_| VcsError::Parse(line.to_string()))?;
        if tag.is_empty() {
            return Err(VcsError::Parse(line.to_string()));
        }
        Ok(Self {
            tag: tag.to_string(),
            distance,
        })
    }
}

/// [`VersionControlQuery`] backed by the `git` command line.
///
/// The first successful `git describe` is kept for the lifetime of the value
/// so tag, distance and clean flag all come from the same snapshot. Use one
/// `GitCli` per stamp.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
    program: String,
    hash_length: usize,
    ceiling_dir: Option<PathBuf>,
    description: OnceCell<Description>,
}

impl GitCli {
    /// Query the repository containing `repo_dir`.
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            program: "git".into(),
            hash_length: DEFAULT_HASH_LENGTH,
            ceiling_dir: None,
            description: OnceCell::new(),
        }
    }

    /// Use a specific git executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Abbreviation length for short hashes, at least [`MIN_HASH_LENGTH`].
    pub fn with_hash_length(mut self, len: usize) -> Self {
        self.hash_length = len.max(MIN_HASH_LENGTH);
        self
    }

    /// Stop repository discovery at `dir` (`GIT_CEILING_DIRECTORIES`), so a
    /// tree outside any repository does not resolve to an enclosing one.
    pub fn with_ceiling_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ceiling_dir = Some(dir.into());
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Absolute path of the repository metadata directory (`.git`).
    pub fn git_dir(&self) -> Result<PathBuf, VcsError> {
        let out = self.run(["rev-parse", "--absolute-git-dir"])?;
        Ok(PathBuf::from(out))
    }

    /// `git describe` of HEAD against the nearest tag on the first-parent
    /// chain, so merged-in side branches do not change the distance.
    pub fn describe(&self) -> Result<Description, VcsError> {
        let out = self.run(["describe", "--tags", "--long", "--first-parent"])?;
        Description::parse(&out)
    }

    fn description(&self) -> Result<&Description, VcsError> {
        if let Some(d) = self.description.get() {
            return Ok(d);
        }
        let d = self.describe()?;
        Ok(self.description.get_or_init(|| d))
    }

    fn has_tracked_changes(&self) -> Result<bool, VcsError> {
        let out = self.run(["status", "--porcelain", "--untracked-files=no"])?;
        Ok(!out.is_empty())
    }

    /// Run git in the repository and return trimmed stdout.
    fn run<I, S>(&self, args: I) -> Result<String, VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let printable = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::debug!(dir = %self.repo_dir.display(), "git {printable}");

        let mut cmd = Command::new(&self.program);
        cmd.arg("-C").arg(&self.repo_dir).args(&args);
        if let Some(ceiling) = &self.ceiling_dir {
            cmd.env("GIT_CEILING_DIRECTORIES", ceiling);
        }
        let output = cmd.output().map_err(|source| VcsError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                args: printable,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|e| VcsError::Parse(String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

impl VersionControlQuery for GitCli {
    fn last_tag(&self) -> Result<String, VcsError> {
        Ok(self.description()?.tag.clone())
    }

    fn commit_distance(&self) -> Result<u32, VcsError> {
        Ok(self.description()?.distance)
    }

    fn commit_hash_short(&self) -> Result<String, VcsError> {
        let short = format!("--short={}", self.hash_length);
        self.run(["rev-parse", short.as_str(), "HEAD"])
    }

    fn commit_hash_full(&self) -> Result<String, VcsError> {
        self.run(["rev-parse", "HEAD"])
    }

    fn branch_name(&self) -> Result<String, VcsError> {
        self.run(["symbolic-ref", "--quiet", "--short", "HEAD"])
    }

    fn is_clean_tag(&self) -> Result<bool, VcsError> {
        if self.description()?.distance != 0 {
            return Ok(false);
        }
        Ok(!self.has_tracked_changes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn describe_parses_simple_tag() {
        let d = Description::parse("v1.2.0-5-gabc1234\n").unwrap();
        assert_eq!(d.tag, "v1.2.0");
        assert_eq!(d.distance, 5);
    }

    #[test]
    fn describe_keeps_dashes_in_tag() {
        let d = Description::parse("release-2024-rc-1-0-g0123abc").unwrap();
        assert_eq!(d.tag, "release-2024-rc-1");
        assert_eq!(d.distance, 0);
    }

    #[test]
    fn describe_rejects_short_output() {
        assert!(Description::parse("abc1234").is_err());
        assert!(Description::parse("v1-x-gabc").is_err());
        assert!(Description::parse("v1-3-abc").is_err());
    }

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Run git in `dir` with a throwaway identity and no signing.
    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args([
                "-c",
                "user.name=mylie",
                "-c",
                "user.email=mylie@localhost",
                "-c",
                "commit.gpgsign=false",
                "-c",
                "tag.gpgsign=false",
            ])
            .args(args)
            .env("GIT_CEILING_DIRECTORIES", dir.parent().unwrap())
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    fn commit(dir: &Path, name: &str) {
        fs::write(dir.join(name), name).unwrap();
        git(dir, &["add", name]);
        git(dir, &["commit", "-q", "-m", name]);
    }

    /// Fresh repository on branch `main` with one commit.
    fn init_repo(root: &Path) -> PathBuf {
        let dir = root.join("repo");
        fs::create_dir_all(&dir).unwrap();
        git(&dir, &["init", "-q"]);
        git(&dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        commit(&dir, "a.txt");
        dir
    }

    fn cli(root: &Path, dir: &Path) -> GitCli {
        GitCli::new(dir).with_ceiling_dir(root)
    }

    #[test]
    fn git_reports_tag_distance_and_branch() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = init_repo(tmp.path());
        git(&dir, &["tag", "v1.0.0"]);
        commit(&dir, "b.txt");
        commit(&dir, "c.txt");

        let repo = cli(tmp.path(), &dir);
        assert_eq!(repo.last_tag().unwrap(), "v1.0.0");
        assert_eq!(repo.commit_distance().unwrap(), 2);
        assert_eq!(repo.branch_name().unwrap(), "main");
        assert!(!repo.is_clean_tag().unwrap());

        let full = repo.commit_hash_full().unwrap();
        let short = repo.commit_hash_short().unwrap();
        assert_eq!(full.len(), 40);
        assert!(full.starts_with(&short));
        assert!(short.len() >= DEFAULT_HASH_LENGTH);
    }

    #[test]
    fn git_clean_tag_requires_unmodified_tree() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = init_repo(tmp.path());
        git(&dir, &["tag", "v2.0.0"]);

        let repo = cli(tmp.path(), &dir);
        assert!(repo.is_clean_tag().unwrap());

        // Untracked files do not count as changes.
        fs::write(dir.join("scratch.txt"), "x").unwrap();
        assert!(repo.is_clean_tag().unwrap());

        fs::write(dir.join("a.txt"), "changed").unwrap();
        assert!(!repo.is_clean_tag().unwrap());
    }

    #[test]
    fn git_detached_head_has_no_branch() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = init_repo(tmp.path());
        commit(&dir, "b.txt");
        git(&dir, &["checkout", "-q", "--detach", "HEAD~1"]);

        let repo = cli(tmp.path(), &dir);
        assert!(repo.branch_name().is_err());
        assert!(repo.commit_hash_full().is_ok());
    }

    #[test]
    fn git_without_tags_fails_describe() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = init_repo(tmp.path());

        let repo = cli(tmp.path(), &dir);
        assert!(repo.last_tag().is_err());
        assert!(repo.commit_distance().is_err());
        assert!(repo.is_clean_tag().is_err());
        assert!(repo.commit_hash_short().is_ok());
    }

    #[test]
    fn git_outside_repository_fails_every_query() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("plain");
        fs::create_dir_all(&dir).unwrap();

        let repo = cli(tmp.path(), &dir);
        assert!(repo.last_tag().is_err());
        assert!(repo.commit_hash_short().is_err());
        assert!(repo.commit_hash_full().is_err());
        assert!(repo.branch_name().is_err());
        assert!(repo.is_clean_tag().is_err());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = GitCli::new(tmp.path()).with_program("mylie-no-such-git");
        assert!(matches!(
            repo.commit_hash_full(),
            Err(VcsError::Spawn { .. })
        ));
    }

    #[test]
    fn git_zero_hash_length_still_describes() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = init_repo(tmp.path());
        git(&dir, &["tag", "v1.0.0"]);

        let repo = cli(tmp.path(), &dir).with_hash_length(0);
        assert_eq!(repo.last_tag().unwrap(), "v1.0.0");
        assert_eq!(repo.commit_distance().unwrap(), 0);
        assert!(repo.is_clean_tag().unwrap());
        assert!(repo.commit_hash_short().unwrap().len() >= MIN_HASH_LENGTH);
    }

    #[test]
    fn git_ignores_tags_on_merged_side_branches() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = init_repo(tmp.path());
        git(&dir, &["tag", "v1.0.0"]);
        git(&dir, &["checkout", "-q", "-b", "side"]);
        commit(&dir, "side.txt");
        git(&dir, &["tag", "v1.1.0-side"]);
        git(&dir, &["checkout", "-q", "main"]);
        commit(&dir, "b.txt");
        git(&dir, &["merge", "-q", "--no-ff", "--no-edit", "side"]);

        let repo = cli(tmp.path(), &dir);
        assert_eq!(repo.last_tag().unwrap(), "v1.0.0");
        assert!(repo.commit_distance().unwrap() > 0);
        assert!(!repo.is_clean_tag().unwrap());
    }

    #[test]
    fn git_answers_from_one_describe_snapshot() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = init_repo(tmp.path());
        git(&dir, &["tag", "v1.0.0"]);
        commit(&dir, "b.txt");

        let repo = cli(tmp.path(), &dir);
        assert_eq!(repo.last_tag().unwrap(), "v1.0.0");
        git(&dir, &["tag", "v1.1.0"]);
        assert_eq!(repo.commit_distance().unwrap(), 1);
        assert!(!repo.is_clean_tag().unwrap());
        assert_eq!(repo.last_tag().unwrap(), "v1.0.0");

        // A fresh query sees the new tag.
        let fresh = cli(tmp.path(), &dir);
        assert_eq!(fresh.last_tag().unwrap(), "v1.1.0");
        assert!(fresh.is_clean_tag().unwrap());
    }

    #[test]
    fn hash_length_is_clamped_to_git_minimum() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = GitCli::new(tmp.path()).with_hash_length(1);
        assert_eq!(repo.hash_length, MIN_HASH_LENGTH);
    }

    #[test]
    fn git_dir_points_at_metadata() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = init_repo(tmp.path());
        let git_dir = cli(tmp.path(), &dir).git_dir().unwrap();
        assert!(git_dir.join("HEAD").is_file());
    }
}
