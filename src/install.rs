//! One installation: resolve, download, link.
//!
//! Every installation runs as its own task with its own progress channel.
//! The task emits exactly one terminal event: `Completed` once the link is
//! published, `Failed` with the first error otherwise.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::download::{DownloadStatus, Downloader};
use crate::error::GpmError;
use crate::link::LinkManager;
use crate::progress::{self, ProgressReceiver, ProgressSender};
use crate::reference::Reference;
use crate::resolver::{ResolvedAsset, Resolver};
use crate::runtime::Runtime;

/// A finished installation.
#[derive(Debug, Clone)]
pub struct Installed {
    pub asset: ResolvedAsset,
    pub link: PathBuf,
    pub status: DownloadStatus,
}

pub type InstallResult = Result<Installed, Arc<GpmError>>;

/// A running installation: the reference it installs, its progress stream,
/// and the task producing it.
pub struct InstallHandle {
    pub reference: Reference,
    pub progress: ProgressReceiver,
    pub task: JoinHandle<InstallResult>,
}

pub struct Installer<R: Runtime> {
    resolver: Resolver,
    downloader: Downloader<R>,
    linker: LinkManager<R>,
}

impl<R: Runtime + 'static> Installer<R> {
    pub fn new(resolver: Resolver, downloader: Downloader<R>, linker: LinkManager<R>) -> Self {
        Self {
            resolver,
            downloader,
            linker,
        }
    }

    /// Install one reference, reporting byte counts on `progress`. No
    /// terminal event is sent; see [`Installer::spawn`].
    #[tracing::instrument(skip(self, progress))]
    pub async fn install(
        &self,
        reference: &Reference,
        link_name: Option<&str>,
        progress: &ProgressSender,
    ) -> InstallResult {
        let mut asset = ResolvedAsset::from(reference);
        asset.link_name = link_name.map(String::from);

        self.resolver.resolve(&mut asset).await?;
        debug!("Resolved {} to {:?}", reference, asset.download_url);

        let status = self
            .downloader
            .download(&asset, self.resolver.download_url(&asset), progress)
            .await?;
        asset.local_path = Some(self.downloader.layout().artifact_path(&asset));

        let link = self.linker.link(&asset, None)?;
        Ok(Installed {
            asset,
            link,
            status,
        })
    }

    /// Run [`Installer::install`] on its own task and close its progress
    /// channel with the outcome.
    pub fn spawn(self: &Arc<Self>, reference: Reference, link_name: Option<String>) -> InstallHandle {
        let (tx, rx) = progress::channel();
        let installer = Arc::clone(self);
        let task_reference = reference.clone();

        let task = tokio::spawn(async move {
            let result = installer
                .install(&task_reference, link_name.as_deref(), &tx)
                .await;
            match &result {
                Ok(_) => tx.complete().await,
                Err(e) => {
                    warn!("Failed to install {}: {}", task_reference, e);
                    tx.fail(Arc::clone(e)).await
                }
            }
            result
        });

        InstallHandle {
            reference,
            progress: rx,
            task,
        }
    }
}
