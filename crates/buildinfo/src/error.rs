use std::process::ExitStatus;

/// Errors from a single version-control query.
///
/// The stamper never propagates these; each one collapses the affected
/// field to its sentinel.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`git {args}` exited with {status}: {stderr}")]
    CommandFailed {
        args: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("unexpected git output: {0:?}")]
    Parse(String),
}

/// Errors from persisting, loading or configuring a stamp.
#[derive(Debug, thiserror::Error)]
pub enum StampError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed property line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },
    #[error("missing property: {0}")]
    MissingKey(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
}
