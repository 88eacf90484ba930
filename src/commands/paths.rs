use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;
use crate::store::StoreLayout;

/// `~/.local/share/gpm`
#[tracing::instrument(skip(runtime))]
pub fn default_store_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let home = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home.join(".local").join("share").join("gpm"))
}

/// `~/.local/bin`
#[tracing::instrument(skip(runtime))]
pub fn default_bin_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let home = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home.join(".local").join("bin"))
}

/// Store and bin roots from the overrides or the defaults, made absolute so
/// link targets do not depend on the working directory.
#[tracing::instrument(skip(runtime))]
pub fn layout<R: Runtime>(
    runtime: &R,
    store_root: Option<PathBuf>,
    bin_root: Option<PathBuf>,
) -> Result<StoreLayout> {
    let store_root = match store_root {
        Some(path) => path,
        None => default_store_root(runtime)?,
    };
    let bin_root = match bin_root {
        Some(path) => path,
        None => default_bin_root(runtime)?,
    };

    let store_root = absolute(&store_root)?;
    let bin_root = absolute(&bin_root)?;
    info!("Using store {:?} and bin {:?}", store_root, bin_root);
    Ok(StoreLayout::new(store_root, bin_root))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Failed to make {:?} absolute", path))
}
