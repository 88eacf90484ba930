//! Textual asset references.
//!
//! A reference names a release asset loosely:
//! `[SITE://][OWNER/]REPOSITORY[@VERSION][:ARTIFACT[,ARTIFACT...]]`.
//! Everything except the repository may be omitted and is filled in later by
//! the resolver. Several comma-separated artifacts fan out into one
//! [`Reference`] per artifact.

use std::fmt;

use crate::error::GpmError;

/// Human readable grammar, shown in usage and parse errors.
pub const FORMAT: &str = "[SITE://][OWNER/]REPOSITORY[@VERSION][:ARTIFACT[,ARTIFACT...]]";

/// Parsed, immutable asset reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reference {
    pub site: Option<String>,
    pub owner: Option<String>,
    pub repository: String,
    /// Exact tag, `latest`, `highest`, or `None` for the highest version.
    pub version: Option<String>,
    /// Artifact to install, `None` to pick the best match for this platform.
    pub artifact: Option<String>,
}

impl Reference {
    /// Parse a raw reference, fanning out one value per named artifact.
    pub fn parse(raw: &str) -> Result<Vec<Reference>, GpmError> {
        if raw.is_empty() {
            return Err(GpmError::parse(raw, "reference is empty"));
        }

        let (site, rest) = match raw.split_once("://") {
            Some((site, rest)) => {
                if site.is_empty() {
                    return Err(GpmError::parse(raw, "site before :// cannot be empty"));
                }
                (Some(site.to_string()), rest)
            }
            None => (None, raw),
        };

        let (head, artifacts) = match rest.split_once(':') {
            Some((head, artifacts)) => (head, Some(artifacts)),
            None => (rest, None),
        };

        let (repo_part, version) = match head.split_once('@') {
            Some((repo_part, version)) => {
                if version.is_empty() {
                    return Err(GpmError::parse(raw, "version after @ cannot be empty"));
                }
                (repo_part, Some(version.to_string()))
            }
            None => (head, None),
        };

        let (owner, repository) = match repo_part.split_once('/') {
            Some((owner, repository)) => {
                if owner.is_empty() {
                    return Err(GpmError::parse(raw, "owner before / cannot be empty"));
                }
                (Some(owner.to_string()), repository)
            }
            None => (None, repo_part),
        };

        if repository.is_empty() {
            return Err(GpmError::parse(raw, "repository is required"));
        }
        if !repository.chars().all(is_identifier_char) {
            return Err(GpmError::parse(
                raw,
                format!("repository {:?} contains invalid characters", repository),
            ));
        }

        let base = Reference {
            site,
            owner,
            repository: repository.to_string(),
            version,
            artifact: None,
        };

        let Some(artifacts) = artifacts else {
            return Ok(vec![base]);
        };

        artifacts
            .split(',')
            .map(|name| {
                if name.is_empty() {
                    return Err(GpmError::parse(raw, "artifact names cannot be empty"));
                }
                Ok(Reference {
                    artifact: Some(name.to_string()),
                    ..base.clone()
                })
            })
            .collect()
    }

    /// Parse many raw references, keeping their order.
    pub fn parse_all<S: AsRef<str>>(raws: &[S]) -> Result<Vec<Reference>, GpmError> {
        let mut references = Vec::with_capacity(raws.len());
        for raw in raws {
            references.extend(Reference::parse(raw.as_ref())?);
        }
        Ok(references)
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(site) = &self.site {
            write!(f, "{}://", site)?;
        }
        if let Some(owner) = &self.owner {
            write!(f, "{}/", owner)?;
        }
        f.write_str(&self.repository)?;
        if let Some(version) = &self.version {
            write!(f, "@{}", version)?;
        }
        if let Some(artifact) = &self.artifact {
            write!(f, ":{}", artifact)?;
        }
        Ok(())
    }
}
