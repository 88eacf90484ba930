//! Turns a loose [`Reference`] into a fully qualified [`ResolvedAsset`].
//!
//! Resolution runs three steps in order (owner, version, artifact). Each
//! step is a single forge round-trip and does nothing when the field it
//! fills is already known, so resolving twice is harmless. A step whose
//! input field is still empty refuses to run.

mod picker;
mod version;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::error::{ForgeStep, GpmError};
use crate::platform::Platform;
use crate::provider::Provider;
use crate::reference::Reference;

pub use picker::{Libc, Pick, SelectionPolicy, is_auxiliary, pick};
pub use version::{VersionSelector, highest, parse_tag};

pub const DEFAULT_SITE: &str = "github.com";

/// A reference whose fields are filled in as resolution progresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedAsset {
    pub site: String,
    pub owner: String,
    pub repository: String,
    pub version: String,
    pub release_id: Option<u64>,
    pub artifact_id: Option<u64>,
    pub artifact_name: String,
    /// Where the forge serves the artifact, known once it is resolved.
    pub download_url: Option<String>,
    /// Where the artifact lives in the store once staged.
    pub local_path: Option<PathBuf>,
    /// Name of the executable link, defaults to the repository.
    pub link_name: Option<String>,
}

impl From<&Reference> for ResolvedAsset {
    fn from(r: &Reference) -> Self {
        ResolvedAsset {
            site: r.site.clone().unwrap_or_else(|| DEFAULT_SITE.to_string()),
            owner: r.owner.clone().unwrap_or_default(),
            repository: r.repository.clone(),
            version: r.version.clone().unwrap_or_default(),
            artifact_name: r.artifact.clone().unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl ResolvedAsset {
    /// The reference this asset currently stands for. Unknown fields are
    /// omitted, the default site is left implicit.
    pub fn to_reference(&self) -> Reference {
        fn non_empty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_string())
        }
        Reference {
            site: (self.site != DEFAULT_SITE)
                .then(|| non_empty(&self.site))
                .flatten(),
            owner: non_empty(&self.owner),
            repository: self.repository.clone(),
            version: non_empty(&self.version),
            artifact: non_empty(&self.artifact_name),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.owner.is_empty()
            && self.release_id.is_some()
            && self.artifact_id.is_some()
            && !self.artifact_name.is_empty()
    }

    fn repository_path(&self) -> String {
        format!("{}/{}/{}", self.site, self.owner, self.repository)
    }

    fn release_label(&self) -> String {
        format!("{}/{}@{}", self.owner, self.repository, self.version)
    }

    fn unresolved(&self, stage: &'static str, missing: &'static str) -> GpmError {
        GpmError::Unresolved {
            reference: self.to_string(),
            stage,
            missing,
        }
    }
}

impl fmt::Display for ResolvedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_reference().fmt(f)
    }
}

pub struct Resolver {
    provider: Arc<dyn Provider>,
    platform: Platform,
    policy: SelectionPolicy,
}

impl Resolver {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            platform: Platform::detect(),
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run every step. The first failure stops resolution.
    #[tracing::instrument(skip_all, fields(asset = %asset))]
    pub async fn resolve(&self, asset: &mut ResolvedAsset) -> Result<(), GpmError> {
        self.resolve_owner(asset).await?;
        self.resolve_version(asset).await?;
        self.resolve_artifact(asset).await?;
        debug!("Resolved {} (artifact id {:?})", asset, asset.artifact_id);
        Ok(())
    }

    /// Guess a missing owner from the most starred repository matching the
    /// name.
    pub async fn resolve_owner(&self, asset: &mut ResolvedAsset) -> Result<(), GpmError> {
        if !asset.owner.is_empty() {
            return Ok(());
        }
        if asset.repository.is_empty() {
            return Err(asset.unresolved("owner", "repository"));
        }

        let repositories = self
            .provider
            .search_repositories(&asset.repository)
            .await
            .map_err(|e| GpmError::forge(ForgeStep::SearchRepositories, &asset.repository, e))?;

        let Some(top) = repositories.into_iter().next() else {
            return Err(GpmError::AmbiguousOwner {
                repository: asset.repository.clone(),
            });
        };
        debug!(
            "Guessed owner of {:?}: {} ({} stars)",
            asset.repository, top.owner, top.stars
        );
        asset.owner = top.owner;
        Ok(())
    }

    /// Pin the release: highest semver, the forge's latest, or an exact tag.
    pub async fn resolve_version(&self, asset: &mut ResolvedAsset) -> Result<(), GpmError> {
        if asset.release_id.is_some() {
            return Ok(());
        }
        if asset.owner.is_empty() {
            return Err(asset.unresolved("version", "owner"));
        }

        let subject = asset.repository_path();
        let release = match VersionSelector::parse(&asset.version) {
            VersionSelector::Highest => {
                let releases = self
                    .provider
                    .list_releases(&asset.owner, &asset.repository)
                    .await
                    .map_err(|e| GpmError::forge(ForgeStep::ListReleases, &subject, e))?;
                highest(&releases)
                    .cloned()
                    .ok_or_else(|| GpmError::NoParseableVersion {
                        repository: subject.clone(),
                    })?
            }
            VersionSelector::Latest => self
                .provider
                .get_latest_release(&asset.owner, &asset.repository)
                .await
                .map_err(|e| GpmError::forge(ForgeStep::LatestRelease, &subject, e))?
                .ok_or_else(|| GpmError::ReleaseNotFound {
                    repository: subject.clone(),
                    tag: "latest".to_string(),
                })?,
            VersionSelector::Tag(tag) => self
                .provider
                .get_release_by_tag(&asset.owner, &asset.repository, &tag)
                .await
                .map_err(|e| GpmError::forge(ForgeStep::ReleaseByTag, &subject, e))?
                .ok_or_else(|| GpmError::ReleaseNotFound {
                    repository: subject.clone(),
                    tag: tag.clone(),
                })?,
        };

        debug!("Selected release {} (id {}) of {}", release.tag, release.id, subject);
        asset.version = release.tag;
        asset.release_id = Some(release.id);
        Ok(())
    }

    /// Pick the artifact for this platform, or look up the id of a named one.
    pub async fn resolve_artifact(&self, asset: &mut ResolvedAsset) -> Result<(), GpmError> {
        if asset.artifact_id.is_some() {
            return Ok(());
        }
        let Some(release_id) = asset.release_id else {
            return Err(asset.unresolved("artifact", "version"));
        };

        let release = asset.release_label();
        let assets = self
            .provider
            .list_release_assets(&asset.owner, &asset.repository, release_id)
            .await
            .map_err(|e| GpmError::forge(ForgeStep::ListReleaseAssets, &release, e))?;

        if !asset.artifact_name.is_empty() {
            let found = assets
                .iter()
                .find(|a| a.name == asset.artifact_name)
                .ok_or_else(|| GpmError::NoMatchingArtifact {
                    release: release.clone(),
                    wanted: asset.artifact_name.clone(),
                })?;
            asset.artifact_id = Some(found.id);
            asset.download_url = Some(found.download_url.clone()).filter(|u| !u.is_empty());
            return Ok(());
        }

        match pick(&assets, &self.platform, &self.policy) {
            Pick::Selected(found) => {
                debug!("Picked artifact {} for {}", found.name, self.platform);
                asset.artifact_id = Some(found.id);
                asset.artifact_name = found.name.clone();
                asset.download_url = Some(found.download_url.clone()).filter(|u| !u.is_empty());
                Ok(())
            }
            Pick::Empty => Err(GpmError::NoArtifact { release }),
            Pick::NoMatch => Err(GpmError::NoMatchingArtifact {
                release,
                wanted: self.platform.to_string(),
            }),
            Pick::Ambiguous(candidates) => Err(GpmError::AmbiguousArtifact {
                release,
                candidates: candidates.iter().map(|a| a.name.clone()).collect(),
            }),
        }
    }

    /// Where the resolved artifact's bytes live. The URL found while
    /// resolving is reused; the forge is asked only when it is unknown.
    pub async fn download_url(&self, asset: &ResolvedAsset) -> Result<String, GpmError> {
        let Some(artifact_id) = asset.artifact_id else {
            return Err(asset.unresolved("download URL", "artifact"));
        };
        if let Some(url) = &asset.download_url {
            return Ok(url.clone());
        }
        self.provider
            .download_url(&asset.owner, &asset.repository, artifact_id)
            .await
            .map_err(|e| GpmError::forge(ForgeStep::DownloadUrl, &asset.artifact_name, e))
    }
}
