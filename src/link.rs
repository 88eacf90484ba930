//! Publishes staged artifacts on the executable search path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, bail};
use log::{debug, info};

use crate::download::ARTIFACT_MODE;
use crate::error::GpmError;
use crate::resolver::ResolvedAsset;
use crate::runtime::Runtime;
use crate::store::StoreLayout;

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A staging name next to `link` that no other call, in this process or
/// another, uses at the same time. Hidden, so the inventory ignores it.
fn staging_path(bin: &Path, name: &str) -> PathBuf {
    let n = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    bin.join(format!(".{}.{}.{}.gpm-tmp", name, std::process::id(), n))
}

pub struct LinkManager<R: Runtime> {
    runtime: Arc<R>,
    layout: StoreLayout,
}

impl<R: Runtime> LinkManager<R> {
    pub fn new(runtime: Arc<R>, layout: StoreLayout) -> Self {
        Self { runtime, layout }
    }

    /// Point `<bin>/<name>` at the asset's artifact, replacing whatever
    /// file or link was there. Returns the link path.
    ///
    /// The new link is created under a temporary name and renamed over the
    /// old one, so the name never disappears from the bin root.
    #[tracing::instrument(skip(self, asset), fields(asset = %asset))]
    pub fn link(
        &self,
        asset: &ResolvedAsset,
        name_override: Option<&str>,
    ) -> Result<PathBuf, GpmError> {
        let target = asset
            .local_path
            .clone()
            .unwrap_or_else(|| self.layout.artifact_path(asset));
        let link = self.layout.link_path(asset, name_override);

        self.replace_link(&target, &link)
            .map_err(|source| GpmError::Link {
                link: link.clone(),
                target: target.clone(),
                source,
            })?;

        info!("Linked {:?} -> {:?}", link, target);
        Ok(link)
    }

    fn replace_link(&self, target: &Path, link: &Path) -> Result<()> {
        if !self.runtime.exists(target) {
            bail!("artifact {:?} is not in the store", target);
        }
        self.runtime.set_permissions(target, ARTIFACT_MODE)?;

        if self.runtime.is_dir(link) && !self.runtime.is_symlink(link) {
            bail!("{:?} is a directory", link);
        }

        let name = link
            .file_name()
            .and_then(|n| n.to_str())
            .context("Link path has no file name")?;
        let bin = link.parent().context("Link path has no parent directory")?;
        self.runtime.create_dir_all(bin)?;

        let staging = staging_path(bin, name);
        if self.runtime.is_symlink(&staging) || self.runtime.exists(&staging) {
            debug!("Removing stale staging link {:?}", staging);
            self.runtime.remove_file(&staging)?;
        }

        self.runtime.symlink(target, &staging)?;
        if let Err(e) = self.runtime.rename(&staging, link) {
            let _ = self.runtime.remove_file(&staging);
            return Err(e);
        }
        Ok(())
    }
}
