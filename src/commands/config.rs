use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    http::HttpClient,
    platform::Platform,
    provider::{GitHubProvider, Provider},
    resolver::{Libc, SelectionPolicy},
    runtime::Runtime,
    store::StoreLayout,
};

use super::paths;

pub const USER_AGENT: &str = "gpm-cli";

/// Settings shared by every subcommand, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub store_root: Option<PathBuf>,
    pub bin_root: Option<PathBuf>,
    pub api_url: Option<String>,
    pub max_extension_len: Option<usize>,
    /// Operating system to select artifacts for, instead of this one.
    pub os: Option<String>,
    /// CPU architecture to select artifacts for, instead of this one.
    pub arch: Option<String>,
    pub libc: Option<Libc>,
}

pub struct Config<R: Runtime> {
    pub runtime: Arc<R>,
    pub http_client: HttpClient,
    pub provider: Arc<dyn Provider>,
    pub layout: StoreLayout,
    pub platform: Platform,
    pub policy: SelectionPolicy,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, options: Options) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!(
                "Using GITHUB_TOKEN for authentication ({} characters)",
                token.len()
            );
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        let http_client = HttpClient::new(client);

        let provider = GitHubProvider::new(http_client.clone(), options.api_url.as_deref());
        let layout = paths::layout(&runtime, options.store_root, options.bin_root)?;

        let mut platform = Platform::detect();
        if let Some(os) = options.os {
            platform.os = os;
        }
        if let Some(arch) = options.arch {
            platform.arch = arch;
        }
        debug!("Selecting artifacts for {}", platform);

        let mut policy = SelectionPolicy {
            libc: options.libc,
            ..Default::default()
        };
        if let Some(max_extension_len) = options.max_extension_len {
            policy.max_extension_len = max_extension_len;
        }

        Ok(Self {
            runtime: Arc::new(runtime),
            http_client,
            provider: Arc::new(provider),
            layout,
            platform,
            policy,
        })
    }
}
