//! Code-forge abstraction.
//!
//! The resolver only talks to a forge through [`Provider`]: one method per
//! round-trip, so every resolution step maps onto exactly one call.

mod github;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use github::{DEFAULT_API_URL, GitHubProvider};

/// A repository returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub stars: u64,
}

/// A published release of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Release {
    pub id: u64,
    /// Version tag (e.g., "v1.0.0")
    pub tag: String,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
    pub download_url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Repositories matching `query`, most starred first. Only the first
    /// page of results is returned.
    async fn search_repositories(&self, query: &str) -> Result<Vec<Repository>>;

    /// Every release of a repository, in the forge's listing order.
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>>;

    /// The release the forge designates as latest, `None` if there is none.
    async fn get_latest_release(&self, owner: &str, repo: &str) -> Result<Option<Release>>;

    /// The release tagged exactly `tag`, `None` if there is none.
    async fn get_release_by_tag(&self, owner: &str, repo: &str, tag: &str)
    -> Result<Option<Release>>;

    async fn list_release_assets(
        &self,
        owner: &str,
        repo: &str,
        release_id: u64,
    ) -> Result<Vec<ReleaseAsset>>;

    /// Where the bytes of an asset can be fetched from.
    async fn download_url(&self, owner: &str, repo: &str, asset_id: u64) -> Result<String>;
}
