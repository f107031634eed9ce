//! Fully-qualified artifact references.
//!
//! Textual form: `[<project>/]<name>[:<alias>]` where `<alias>` is `latest`
//! or `v<N>`. A missing alias means `latest`; a missing project is filled in
//! by the store's default project at resolution time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Which version of a named artifact a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactAlias {
    /// The most recently uploaded version.
    Latest,
    /// A fixed version number (`v0`, `v1`, ...).
    Version(u32),
}

impl fmt::Display for ArtifactAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactAlias::Latest => f.write_str("latest"),
            ArtifactAlias::Version(v) => write!(f, "v{v}"),
        }
    }
}

impl FromStr for ArtifactAlias {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "latest" {
            return Ok(ArtifactAlias::Latest);
        }
        s.strip_prefix('v')
            .and_then(|n| n.parse::<u32>().ok())
            .map(ArtifactAlias::Version)
            .ok_or_else(|| format!("alias {s:?} must be `latest` or `v<N>`"))
    }
}

/// Reference to one version of a stored artifact. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactRef {
    project: Option<String>,
    name: String,
    alias: ArtifactAlias,
}

impl ArtifactRef {
    /// Reference to the latest version of `name` in the default project.
    pub fn latest(name: &str) -> StorageResult<Self> {
        validate_segment(name).map_err(|reason| invalid(name, reason))?;
        Ok(Self {
            project: None,
            name: name.to_string(),
            alias: ArtifactAlias::Latest,
        })
    }

    /// Fully pinned reference. Callers are expected to pass names that were
    /// already validated (e.g. taken from a stored record).
    pub fn pinned(project: &str, name: &str, version: u32) -> Self {
        Self {
            project: Some(project.to_string()),
            name: name.to_string(),
            alias: ArtifactAlias::Version(version),
        }
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> ArtifactAlias {
        self.alias
    }

    /// Project this reference resolves in, given the store's default.
    pub fn project_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.project.as_deref().unwrap_or(default)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{}/{}:{}", project, self.name, self.alias),
            None => write!(f, "{}:{}", self.name, self.alias),
        }
    }
}

impl FromStr for ArtifactRef {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid(s, "reference is empty".to_string()));
        }

        let (path, alias) = match trimmed.rsplit_once(':') {
            Some((path, alias)) => (path, alias.parse().map_err(|e| invalid(s, e))?),
            None => (trimmed, ArtifactAlias::Latest),
        };

        let (project, name) = match path.rsplit_once('/') {
            Some((project, name)) => (Some(project), name),
            None => (None, path),
        };

        validate_segment(name).map_err(|reason| invalid(s, reason))?;
        if let Some(project) = project {
            for segment in project.split('/') {
                validate_segment(segment).map_err(|reason| invalid(s, reason))?;
            }
        }

        Ok(Self {
            project: project.map(str::to_string),
            name: name.to_string(),
            alias,
        })
    }
}

impl TryFrom<String> for ArtifactRef {
    type Error = StorageError;

    fn try_from(s: String) -> StorageResult<Self> {
        s.parse()
    }
}

impl From<ArtifactRef> for String {
    fn from(r: ArtifactRef) -> Self {
        r.to_string()
    }
}

/// Check one `/`-separated segment of a reference. Segments become directory
/// names in the filesystem store, so anything that could escape the store
/// root is refused.
pub(crate) fn validate_segment(segment: &str) -> std::result::Result<(), String> {
    if segment.is_empty() {
        return Err("name segment is empty".to_string());
    }
    if segment.starts_with('.') {
        return Err(format!("name segment {segment:?} must not start with '.'"));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(format!("name segment {segment:?} contains {c:?}"));
    }
    Ok(())
}

fn invalid(reference: &str, reason: String) -> StorageError {
    StorageError::InvalidReference {
        reference: reference.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_name_defaults_to_latest() {
        let r: ArtifactRef = "sample.csv".parse().unwrap();
        assert_eq!(r.project(), None);
        assert_eq!(r.name(), "sample.csv");
        assert_eq!(r.alias(), ArtifactAlias::Latest);
        assert_eq!(r.to_string(), "sample.csv:latest");
    }

    #[test]
    fn parse_fully_qualified() {
        let r: ArtifactRef = "team/nyc_airbnb/clean_sample.csv:v3".parse().unwrap();
        assert_eq!(r.project(), Some("team/nyc_airbnb"));
        assert_eq!(r.name(), "clean_sample.csv");
        assert_eq!(r.alias(), ArtifactAlias::Version(3));
        assert_eq!(r.to_string(), "team/nyc_airbnb/clean_sample.csv:v3");
    }

    #[test]
    fn parse_rejects_bad_alias() {
        let err = "sample.csv:v-1".parse::<ArtifactRef>().unwrap_err();
        assert!(matches!(err, StorageError::InvalidReference { .. }));
        assert!("sample.csv:newest".parse::<ArtifactRef>().is_err());
    }

    #[test]
    fn parse_rejects_empty_and_traversal() {
        assert!("".parse::<ArtifactRef>().is_err());
        assert!("   ".parse::<ArtifactRef>().is_err());
        assert!("../etc/passwd:latest".parse::<ArtifactRef>().is_err());
        assert!("proj//name".parse::<ArtifactRef>().is_err());
        assert!("name with space".parse::<ArtifactRef>().is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let r = ArtifactRef::pinned("default", "sample.csv", 2);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"default/sample.csv:v2\"");
        let back: ArtifactRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn project_or_falls_back_to_default() {
        let r = ArtifactRef::latest("sample.csv").unwrap();
        assert_eq!(r.project_or("default"), "default");
        let r: ArtifactRef = "other/sample.csv".parse().unwrap();
        assert_eq!(r.project_or("default"), "other");
    }
}
