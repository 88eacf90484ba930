//! GitHub REST implementation of [`Provider`].

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::Url;

use crate::http::HttpClient;

use super::{Provider, Release, ReleaseAsset, Repository};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

// Listing endpoints are paged; 10 pages of 100 is plenty for any repository.
const PER_PAGE: usize = 100;
const MAX_PAGES: u32 = 10;
const SEARCH_RESULTS: &str = "20";

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct SearchResult {
        pub items: Vec<Repo>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Repo {
        pub name: String,
        pub owner: Owner,
        #[serde(default)]
        pub stargazers_count: u64,
    }

    #[derive(Deserialize, Debug)]
    pub struct Owner {
        pub login: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub id: u64,
        pub tag_name: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub id: u64,
        pub name: String,
        pub browser_download_url: String,
    }
}

pub struct GitHubProvider {
    http_client: HttpClient,
    api_url: String,
}

impl GitHubProvider {
    pub fn new(http_client: HttpClient, api_url: Option<&str>) -> Self {
        Self {
            http_client,
            api_url: api_url
                .unwrap_or(DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// `<api>/<segment>/<segment>/...`, each segment percent-encoded so a
    /// tag like `v1#rc` stays one path component.
    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let mut url = Url::parse(&self.api_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("API URL {} cannot carry a path", self.api_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    async fn get_paged<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let per_page = PER_PAGE.to_string();

        for page in 1..=MAX_PAGES {
            debug!("Fetching page {} of {}...", page, url);
            let page = page.to_string();
            let parsed: Vec<T> = self
                .http_client
                .get_json_with_query(url, &[("per_page", per_page.as_str()), ("page", page.as_str())])
                .await?;

            let last = parsed.len() < PER_PAGE;
            items.extend(parsed);
            if last {
                break;
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    #[tracing::instrument(skip(self))]
    async fn search_repositories(&self, query: &str) -> Result<Vec<Repository>> {
        let url = self.endpoint(&["search", "repositories"])?;
        let result: api::SearchResult = self
            .http_client
            .get_json_with_query(
                &url,
                &[
                    ("q", query),
                    ("sort", "stars"),
                    ("order", "desc"),
                    ("per_page", SEARCH_RESULTS),
                ],
            )
            .await?;
        Ok(result.items.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let url = self.endpoint(&["repos", owner, repo, "releases"])?;
        let releases: Vec<api::Release> = self.get_paged(&url).await?;
        Ok(releases.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_latest_release(&self, owner: &str, repo: &str) -> Result<Option<Release>> {
        let url = self.endpoint(&["repos", owner, repo, "releases", "latest"])?;
        let release: Option<api::Release> = self.http_client.get_json_optional(&url).await?;
        Ok(release.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    async fn get_release_by_tag(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<Release>> {
        let url = self.endpoint(&["repos", owner, repo, "releases", "tags", tag])?;
        let release: Option<api::Release> = self.http_client.get_json_optional(&url).await?;
        Ok(release.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    async fn list_release_assets(
        &self,
        owner: &str,
        repo: &str,
        release_id: u64,
    ) -> Result<Vec<ReleaseAsset>> {
        let id = release_id.to_string();
        let url = self.endpoint(&["repos", owner, repo, "releases", &id, "assets"])?;
        let assets: Vec<api::Asset> = self.get_paged(&url).await?;
        Ok(assets.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn download_url(&self, owner: &str, repo: &str, asset_id: u64) -> Result<String> {
        let id = asset_id.to_string();
        let url = self.endpoint(&["repos", owner, repo, "releases", "assets", &id])?;
        let asset: api::Asset = self.http_client.get_json(&url).await?;
        Ok(asset.browser_download_url)
    }
}

impl From<api::Repo> for Repository {
    fn from(r: api::Repo) -> Self {
        Repository {
            owner: r.owner.login,
            name: r.name,
            stars: r.stargazers_count,
        }
    }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        Release {
            id: r.id,
            tag: r.tag_name,
        }
    }
}

impl From<api::Asset> for ReleaseAsset {
    fn from(a: api::Asset) -> Self {
        ReleaseAsset {
            id: a.id,
            name: a.name,
            download_url: a.browser_download_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use reqwest::Client;

    fn provider(url: &str) -> GitHubProvider {
        GitHubProvider::new(HttpClient::new(Client::new()), Some(url))
    }

    /// A JSON page of `count` releases with ids starting at `first`.
    fn releases_page(first: u64, count: u64) -> String {
        let items: Vec<String> = (first..first + count)
            .map(|id| format!(r#"{{"id": {}, "tag_name": "v0.{}.0"}}"#, id, id))
            .collect();
        format!("[{}]", items.join(","))
    }

    #[test]
    fn test_endpoint_defaults_to_github() {
        let provider = GitHubProvider::new(HttpClient::new(Client::new()), None);
        assert_eq!(
            provider.endpoint(&["repos", "o", "r"]).unwrap(),
            "https://api.github.com/repos/o/r"
        );
    }

    #[test]
    fn test_endpoint_keeps_api_prefix_and_encodes_segments() {
        let provider = provider("http://x/api/v3/");
        assert_eq!(
            provider
                .endpoint(&["repos", "o", "r", "releases", "tags", "v1#rc?x/y"])
                .unwrap(),
            "http://x/api/v3/repos/o/r/releases/tags/v1%23rc%3Fx%2Fy"
        );
    }

    #[tokio::test]
    async fn test_search_repositories() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "ripgrep".into()),
                Matcher::UrlEncoded("sort".into(), "stars".into()),
                Matcher::UrlEncoded("order".into(), "desc".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"total_count": 2, "items": [
                    {"name": "ripgrep", "owner": {"login": "BurntSushi"}, "stargazers_count": 50000},
                    {"name": "ripgrep-all", "owner": {"login": "phiresky"}}
                ]}"#,
            )
            .create_async()
            .await;

        let repos = provider(&server.url())
            .search_repositories("ripgrep")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            repos,
            vec![
                Repository {
                    owner: "BurntSushi".into(),
                    name: "ripgrep".into(),
                    stars: 50000,
                },
                Repository {
                    owner: "phiresky".into(),
                    name: "ripgrep-all".into(),
                    stars: 0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_short_page_is_the_last_request() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/repos/o/r/releases?per_page=100&page=1")
            .with_status(200)
            .with_body(r#"[{"id": 1, "tag_name": "v1.0.0"}]"#)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/repos/o/r/releases?per_page=100&page=2")
            .expect(0)
            .create_async()
            .await;

        let releases = provider(&server.url()).list_releases("o", "r").await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        assert_eq!(
            releases,
            vec![Release {
                id: 1,
                tag: "v1.0.0".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_list_releases_paginates() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/repos/o/r/releases?per_page=100&page=1")
            .with_status(200)
            .with_body(releases_page(1, 100))
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/repos/o/r/releases?per_page=100&page=2")
            .with_status(200)
            .with_body(releases_page(101, 2))
            .create_async()
            .await;
        let page3 = server
            .mock("GET", "/repos/o/r/releases?per_page=100&page=3")
            .expect(0)
            .create_async()
            .await;

        let releases = provider(&server.url()).list_releases("o", "r").await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        page3.assert_async().await;
        assert_eq!(releases.len(), 102);
        assert_eq!(releases[0].tag, "v0.1.0");
        assert_eq!(releases[101].id, 102);
    }

    #[tokio::test]
    async fn test_list_releases_stops_after_max_pages() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for page in 1..=10u64 {
            let mock = server
                .mock(
                    "GET",
                    format!("/repos/o/r/releases?per_page=100&page={}", page).as_str(),
                )
                .with_status(200)
                .with_body(releases_page((page - 1) * 100 + 1, 100))
                .create_async()
                .await;
            mocks.push(mock);
        }
        let page11 = server
            .mock("GET", "/repos/o/r/releases?per_page=100&page=11")
            .expect(0)
            .create_async()
            .await;

        let releases = provider(&server.url()).list_releases("o", "r").await.unwrap();

        for mock in mocks {
            mock.assert_async().await;
        }
        page11.assert_async().await;
        assert_eq!(releases.len(), 1000);
    }

    #[tokio::test]
    async fn test_get_latest_release() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/o/r/releases/latest")
            .with_status(200)
            .with_body(r#"{"id": 42, "tag_name": "v3.1.4", "prerelease": false}"#)
            .create_async()
            .await;

        // trailing slash on the API URL is tolerated
        let release = provider(&format!("{}/", server.url()))
            .get_latest_release("o", "r")
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(release.id, 42);
        assert_eq!(release.tag, "v3.1.4");
    }

    #[tokio::test]
    async fn test_get_release_by_tag_missing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/o/r/releases/tags/v9.9.9")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let release = provider(&server.url())
            .get_release_by_tag("o", "r", "v9.9.9")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(release.is_none());
    }

    #[tokio::test]
    async fn test_get_release_by_tag_encodes_tag() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/o/r/releases/tags/v1%23rc")
            .with_status(200)
            .with_body(r##"{"id": 5, "tag_name": "v1#rc"}"##)
            .create_async()
            .await;

        let release = provider(&server.url())
            .get_release_by_tag("o", "r", "v1#rc")
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(release.tag, "v1#rc");
    }

    #[tokio::test]
    async fn test_get_release_by_tag_server_error_is_an_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/o/r/releases/tags/v1")
            .with_status(500)
            .create_async()
            .await;

        let result = provider(&server.url())
            .get_release_by_tag("o", "r", "v1")
            .await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_release_assets() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/repos/o/r/releases/7/assets?per_page=100&page=1")
            .with_status(200)
            .with_body(
                r#"[{"id": 70, "name": "tool-linux-amd64", "size": 1024,
                     "content_type": "application/octet-stream",
                     "browser_download_url": "https://example.com/tool-linux-amd64"}]"#,
            )
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/repos/o/r/releases/7/assets?per_page=100&page=2")
            .expect(0)
            .create_async()
            .await;

        let assets = provider(&server.url())
            .list_release_assets("o", "r", 7)
            .await
            .unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        assert_eq!(
            assets,
            vec![ReleaseAsset {
                id: 70,
                name: "tool-linux-amd64".into(),
                download_url: "https://example.com/tool-linux-amd64".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_download_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/o/r/releases/assets/70")
            .with_status(200)
            .with_body(
                r#"{"id": 70, "name": "tool", "browser_download_url": "https://example.com/dl/tool"}"#,
            )
            .create_async()
            .await;

        let url = provider(&server.url())
            .download_url("o", "r", 70)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(url, "https://example.com/dl/tool");
    }
}
