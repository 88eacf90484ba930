//! Streams a resolved artifact into the store.

mod inflight;
mod sniff;

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use log::{debug, info};

use crate::error::GpmError;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, ProgressSender};
use crate::resolver::ResolvedAsset;
use crate::runtime::Runtime;
use crate::store::{StoreLayout, ensure_marker};

pub use inflight::{Claim, InFlight, Outcome};
pub use sniff::{OCTET_STREAM, SNIFF_LEN, detect_content_type};

/// Mode of a staged artifact: read and execute, owner only.
pub const ARTIFACT_MODE: u32 = 0o500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloaded { bytes: u64 },
    /// The artifact was already in the store; nothing was fetched.
    AlreadyPresent,
    /// Another task was writing the same artifact; its outcome was reused.
    Joined,
}

pub struct Downloader<R: Runtime> {
    runtime: Arc<R>,
    http_client: HttpClient,
    layout: StoreLayout,
    in_flight: InFlight,
}

impl<R: Runtime> Downloader<R> {
    pub fn new(runtime: Arc<R>, http_client: HttpClient, layout: StoreLayout) -> Self {
        Self {
            runtime,
            http_client,
            layout,
            in_flight: InFlight::new(),
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Fetch the asset into its store path, reporting byte counts on
    /// `progress`. Terminal events are left to the caller.
    ///
    /// `url` is only awaited when bytes actually have to be fetched: not
    /// when the artifact is already stored, nor when another task is
    /// writing it.
    ///
    /// At most one transfer per destination runs at a time; a concurrent
    /// caller for the same destination waits for it and shares its outcome.
    #[tracing::instrument(skip(self, asset, url, progress), fields(asset = %asset))]
    pub async fn download<F>(
        &self,
        asset: &ResolvedAsset,
        url: F,
        progress: &ProgressSender,
    ) -> Result<DownloadStatus, Arc<GpmError>>
    where
        F: Future<Output = Result<String, GpmError>>,
    {
        let destination = self.layout.artifact_path(asset);

        match self.in_flight.claim(&destination) {
            Claim::Follower(follower) => {
                debug!("Joining in-flight transfer to {:?}", destination);
                match follower.wait().await {
                    Some(Ok(())) => Ok(DownloadStatus::Joined),
                    Some(Err(e)) => Err(e),
                    None => Err(Arc::new(GpmError::download(
                        &asset.artifact_name,
                        anyhow!("the concurrent transfer to {:?} was abandoned", destination),
                    ))),
                }
            }
            Claim::Leader(guard) => {
                let result = self
                    .transfer(asset, url, &destination, progress)
                    .await
                    .map_err(Arc::new);
                guard.finish(result.as_ref().map(|_| ()).map_err(Arc::clone));
                result
            }
        }
    }

    async fn transfer<F>(
        &self,
        asset: &ResolvedAsset,
        url: F,
        destination: &Path,
        progress: &ProgressSender,
    ) -> Result<DownloadStatus, GpmError>
    where
        F: Future<Output = Result<String, GpmError>>,
    {
        let name = &asset.artifact_name;

        if self.runtime.exists(destination) {
            info!("{:?} already exists: skipping download", destination);
            return Ok(DownloadStatus::AlreadyPresent);
        }

        let url = url.await?;
        info!("Downloading {} from {}...", name, url);
        let mut response = self
            .http_client
            .get_stream(&url)
            .await
            .map_err(|e| GpmError::download(name, e))?;

        if let Some(total) = response.content_length() {
            progress.emit(ProgressEvent::TotalSize(total)).await;
        }

        // Nothing touches the store until the head has been sniffed.
        let mut head = Vec::with_capacity(SNIFF_LEN);
        let mut finished = false;
        while head.len() < SNIFF_LEN {
            match response.chunk().await.map_err(|e| GpmError::download(name, e.into()))? {
                Some(chunk) => head.extend_from_slice(&chunk),
                None => {
                    finished = true;
                    break;
                }
            }
        }

        let content_type = detect_content_type(&head);
        if content_type != OCTET_STREAM {
            return Err(GpmError::UnsupportedFormat {
                artifact: name.clone(),
                content_type: content_type.to_string(),
            });
        }

        let mut file = self
            .create_destination(destination)
            .map_err(|e| GpmError::download(name, e))?;

        let mut written = 0u64;
        self.write_chunk(&mut file, &head, &mut written, progress)
            .await
            .map_err(|e| GpmError::download(name, e))?;

        if !finished {
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| GpmError::download(name, e.into()))?
            {
                self.write_chunk(&mut file, &chunk, &mut written, progress)
                    .await
                    .map_err(|e| GpmError::download(name, e))?;
            }
        }

        file.flush()
            .context("Failed to flush artifact")
            .map_err(|e| GpmError::download(name, e))?;
        drop(file);

        self.runtime
            .set_permissions(destination, ARTIFACT_MODE)
            .map_err(|e| GpmError::download(name, e))?;

        info!("Downloaded {} ({} bytes).", name, written);
        Ok(DownloadStatus::Downloaded { bytes: written })
    }

    fn create_destination(&self, destination: &Path) -> anyhow::Result<Box<dyn Write + Send>> {
        ensure_marker(self.runtime.as_ref(), self.layout.store_root())?;
        let parent = destination
            .parent()
            .context("Artifact path has no parent directory")?;
        self.runtime.create_dir_all(parent)?;
        self.runtime.create_file(destination)
    }

    async fn write_chunk(
        &self,
        file: &mut Box<dyn Write + Send>,
        chunk: &[u8],
        written: &mut u64,
        progress: &ProgressSender,
    ) -> anyhow::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        file.write_all(chunk).context("Failed to write artifact")?;
        *written += chunk.len() as u64;
        progress
            .emit(ProgressEvent::BytesRead(chunk.len() as u64))
            .await;
        progress.emit(ProgressEvent::CurrentSize(*written)).await;
        Ok(())
    }
}
