use anyhow::{Context, Result};
use log::debug;

use crate::{provider::Repository, runtime::Runtime};

use super::config::{Config, Options};

/// Print the repositories matching `query`, most starred first.
#[tracing::instrument(skip(runtime, options))]
pub async fn search<R: Runtime>(runtime: R, query: &str, options: Options) -> Result<()> {
    let config = Config::new(runtime, options)?;
    let repositories = config
        .provider
        .search_repositories(query)
        .await
        .with_context(|| format!("Failed to search repositories for {:?}", query))?;
    debug!("Search for {:?} returned {} repositories", query, repositories.len());

    print!("{}", render_search(&repositories));
    Ok(())
}

pub(crate) fn render_search(repositories: &[Repository]) -> String {
    if repositories.is_empty() {
        return "No repositories found.\n".to_string();
    }
    repositories
        .iter()
        .map(|repo| format!("{}/{} ({} stars)\n", repo.owner, repo.name, repo.stars))
        .collect()
}
