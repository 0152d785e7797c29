//! Python runtime version inference.
//!
//! The python build and run images are versioned, so when either one still
//! needs its default the project is inspected for a declared interpreter
//! version: `Pipfile.lock`, then `poetry.lock`, then `runtime.txt`. The
//! declaration is read as a constraint and matched against the supported list
//! in order.

use semver::{Version, VersionReq};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Supported python versions in preference order.
pub const SUPPORTED_PYTHON_VERSIONS: &[&str] = &["3.8", "3.9", "3.10", "3.11", "3.12"];

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("failed to parse python version from {file}: {message}")]
    Parse { file: String, message: String },
    #[error("no supported python version satisfies '{constraint}' (supported: {})", supported.join(", "))]
    NoSupportedVersion {
        constraint: String,
        supported: Vec<String>,
    },
}

#[derive(Deserialize)]
struct PipfileLock {
    #[serde(rename = "_meta", default)]
    meta: PipfileMeta,
}

#[derive(Deserialize, Default)]
struct PipfileMeta {
    #[serde(default)]
    requires: PipfileRequires,
}

#[derive(Deserialize, Default)]
struct PipfileRequires {
    #[serde(default)]
    python_version: Option<String>,
}

#[derive(Deserialize)]
struct PoetryLock {
    #[serde(default)]
    metadata: PoetryMetadata,
}

#[derive(Deserialize, Default)]
struct PoetryMetadata {
    #[serde(rename = "python-versions", default)]
    python_versions: Option<String>,
}

/// Resolve the python `major.minor` to build with for the project in `dir`.
pub fn resolve_python_version(dir: &Path, supported: &[&str]) -> Result<String, VersionError> {
    let Some((file, constraint)) = declared_constraint(dir)? else {
        let latest = supported.last().copied().unwrap_or("3.12");
        debug!("no python version declared, using {latest}");
        return Ok(latest.to_owned());
    };
    debug!("python constraint '{constraint}' from {file}");
    match_supported(file, &constraint, supported)
}

fn declared_constraint(dir: &Path) -> Result<Option<(&'static str, String)>, VersionError> {
    if let Some(v) = read_source(dir, "Pipfile.lock", |content| {
        let lock: PipfileLock =
            serde_json::from_str(content).map_err(|e| e.to_string())?;
        Ok(lock.meta.requires.python_version)
    })? {
        return Ok(Some(("Pipfile.lock", v)));
    }

    if let Some(v) = read_source(dir, "poetry.lock", |content| {
        let lock: PoetryLock = toml::from_str(content).map_err(|e| e.to_string())?;
        Ok(lock.metadata.python_versions)
    })? {
        return Ok(Some(("poetry.lock", v)));
    }

    if let Some(v) = read_source(dir, "runtime.txt", parse_runtime_txt)? {
        return Ok(Some(("runtime.txt", v)));
    }

    Ok(None)
}

/// Read and parse one declaration file. Missing files and blank or `*`
/// declarations yield `None`.
fn read_source(
    dir: &Path,
    file: &str,
    parse: impl FnOnce(&str) -> Result<Option<String>, String>,
) -> Result<Option<String>, VersionError> {
    let path = dir.join(file);
    if !path.is_file() {
        return Ok(None);
    }
    let parse_error = |message: String| VersionError::Parse {
        file: file.to_owned(),
        message,
    };
    let content = fs::read_to_string(&path).map_err(|e| parse_error(e.to_string()))?;
    let value = parse(&content).map_err(parse_error)?;
    Ok(value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && v != "*"))
}

/// `python-3.10.4` becomes `3.10`.
fn parse_runtime_txt(content: &str) -> Result<Option<String>, String> {
    let line = content.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (_, raw) = line
        .split_once('-')
        .ok_or_else(|| format!("expected 'python-X.Y.Z', found '{line}'"))?;
    let version = parse_loose_version(raw).ok_or_else(|| format!("invalid version '{raw}'"))?;
    Ok(Some(format!("{}.{}", version.major, version.minor)))
}

/// Parse `X`, `X.Y` or `X.Y.Z`, padding missing components with zero.
fn parse_loose_version(raw: &str) -> Option<Version> {
    let mut parts = raw.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() {
        return None;
    }
    Some(Version::new(major, minor, patch))
}

fn match_supported(
    file: &str,
    constraint: &str,
    supported: &[&str],
) -> Result<String, VersionError> {
    let alternatives = parse_constraint(constraint).map_err(|message| VersionError::Parse {
        file: file.to_owned(),
        message,
    })?;

    for candidate in supported {
        let Some(version) = parse_loose_version(candidate) else {
            continue;
        };
        if alternatives.iter().any(|req| req.matches(&version)) {
            return Ok(format!("{}.{}", version.major, version.minor));
        }
    }

    Err(VersionError::NoSupportedVersion {
        constraint: constraint.to_owned(),
        supported: supported.iter().map(|s| (*s).to_owned()).collect(),
    })
}

/// Parse a python-style constraint into `||` alternatives.
///
/// Comparators may be separated by commas or whitespace, and an operator may
/// be separated from its version by spaces. A bare version pins its
/// `major.minor`.
fn parse_constraint(constraint: &str) -> Result<Vec<VersionReq>, String> {
    constraint
        .split("||")
        .map(|alternative| {
            let comparators = split_comparators(alternative);
            if comparators.is_empty() {
                return Err(format!("empty constraint in '{constraint}'"));
            }
            let normalized: Vec<String> = comparators.iter().map(|c| pin_bare(c)).collect();
            VersionReq::parse(&normalized.join(", "))
                .map_err(|e| format!("invalid constraint '{}': {e}", alternative.trim()))
        })
        .collect()
}

fn split_comparators(alternative: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut pending_op = String::new();
    for token in alternative
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^' | '!')) {
            pending_op.push_str(token);
            continue;
        }
        out.push(format!("{}{token}", std::mem::take(&mut pending_op)));
    }
    out
}

fn pin_bare(comparator: &str) -> String {
    if comparator.starts_with(|c: char| c.is_ascii_digit()) && !comparator.contains('*') {
        let mut parts = comparator.split('.');
        let major = parts.next().unwrap_or_default();
        match parts.next() {
            Some(minor) => format!("={major}.{minor}"),
            None => format!("={major}"),
        }
    } else if let Some(rest) = comparator.strip_prefix("==") {
        pin_bare(rest)
    } else {
        comparator.to_owned()
    }
}
