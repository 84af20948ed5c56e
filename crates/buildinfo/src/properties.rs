//! `version.properties` codec.
//!
//! Format: UTF-8, one `key=value` line per descriptor field in
//! [`PROPERTY_KEYS`](crate::PROPERTY_KEYS) order. Values escape backslash,
//! newline, carriage return and tab; everything else is written verbatim.

use crate::descriptor::BuildDescriptor;
use crate::error::StampError;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Conventional resource path of the descriptor inside the artifact.
pub const RESOURCE_PATH: &str = "mylie/engine/version.properties";

/// Serialize a descriptor to property-file text.
pub fn render(descriptor: &BuildDescriptor) -> String {
    let mut out = String::new();
    for (key, value) in descriptor.entries() {
        out.push_str(key);
        out.push('=');
        out.push_str(&escape(&value));
        out.push('\n');
    }
    out
}

/// Parse property-file text into a key/value map.
///
/// Blank lines and lines starting with `#` or `!` are skipped.
pub fn parse(text: &str) -> Result<BTreeMap<String, String>, StampError> {
    let mut props = BTreeMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(StampError::MalformedLine {
                line: idx + 1,
                content: raw.to_string(),
            });
        };
        props.insert(key.trim().to_string(), unescape(value));
    }
    Ok(props)
}

/// Write the descriptor to `path`, replacing any existing file.
///
/// The content goes to a temporary file in the destination directory, is
/// synced, then renamed over `path`.
pub fn persist(descriptor: &BuildDescriptor, path: impl AsRef<Path>) -> Result<(), StampError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(render(descriptor).as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    tracing::info!(path = %path.display(), "wrote build descriptor");
    Ok(())
}

/// Read and validate a persisted descriptor.
pub fn load(path: impl AsRef<Path>) -> Result<BuildDescriptor, StampError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    BuildDescriptor::from_properties(&parse(&text)?)
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
