//! Error taxonomy for the resolve → download → link pipeline.
//!
//! Every stage of an installation fails with one of these variants so the
//! front end can report exactly which field or step could not be settled.
//! Lower-level causes (HTTP, filesystem) travel as `anyhow::Error` sources.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::reference::FORMAT;

/// A forge round-trip performed while resolving a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgeStep {
    SearchRepositories,
    ListReleases,
    LatestRelease,
    ReleaseByTag,
    ListReleaseAssets,
    DownloadUrl,
}

impl fmt::Display for ForgeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            ForgeStep::SearchRepositories => "search repositories",
            ForgeStep::ListReleases => "list releases",
            ForgeStep::LatestRelease => "fetch the latest release",
            ForgeStep::ReleaseByTag => "fetch release by tag",
            ForgeStep::ListReleaseAssets => "list release assets",
            ForgeStep::DownloadUrl => "get the download URL",
        };
        f.write_str(step)
    }
}

#[derive(Debug, Error)]
pub enum GpmError {
    #[error("invalid reference {input:?}: {reason} (expected {})", FORMAT)]
    Parse { input: String, reason: String },

    #[error("no repository named {repository:?} found, cannot guess its owner")]
    AmbiguousOwner { repository: String },

    #[error("could not parse any release version of {repository}")]
    NoParseableVersion { repository: String },

    #[error("release {tag:?} not found in {repository}")]
    ReleaseNotFound { repository: String, tag: String },

    #[error("no artifact found in {release}")]
    NoArtifact { release: String },

    #[error("no artifact of {release} matches {wanted}")]
    NoMatchingArtifact { release: String, wanted: String },

    #[error("cannot choose between artifacts of {release}: {}", .candidates.join(", "))]
    AmbiguousArtifact {
        release: String,
        candidates: Vec<String>,
    },

    #[error("cannot resolve the {stage} of {reference}: {missing} is not resolved yet")]
    Unresolved {
        reference: String,
        stage: &'static str,
        missing: &'static str,
    },

    #[error("failed to {step} for {subject}")]
    Forge {
        step: ForgeStep,
        subject: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to download {artifact}")]
    Download {
        artifact: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "unsupported format {content_type} for {artifact}: only application/octet-stream can be installed"
    )]
    UnsupportedFormat {
        artifact: String,
        content_type: String,
    },

    #[error("failed to link {link:?} -> {target:?}")]
    Link {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("store layout version {found:?} in {root:?} is not supported (expected {expected})")]
    LayoutMismatch {
        root: PathBuf,
        found: String,
        expected: u32,
    },
}

impl GpmError {
    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        GpmError::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn forge(step: ForgeStep, subject: impl ToString, source: anyhow::Error) -> Self {
        GpmError::Forge {
            step,
            subject: subject.to_string(),
            source,
        }
    }

    pub(crate) fn download(artifact: impl ToString, source: anyhow::Error) -> Self {
        GpmError::Download {
            artifact: artifact.to_string(),
            source,
        }
    }
}
