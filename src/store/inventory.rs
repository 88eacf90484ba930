//! Rebuilds what is installed and linked from the filesystem alone.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::debug;

use super::layout::{StoreLayout, check_marker, decode_segment};
use crate::resolver::ResolvedAsset;
use crate::runtime::{Runtime, is_path_under};

/// A symlink in the bin root that points into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAsset {
    pub link: PathBuf,
    pub target: PathBuf,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Dir,
    File,
}

/// Visible entries of `dir` of the wanted kind, with their names. Anything
/// else is skipped with a debug diagnostic.
fn entries<R: Runtime>(runtime: &R, dir: &Path, kind: Kind) -> Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    for path in runtime.read_dir(dir)? {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!("Skipping {:?}: name is not valid UTF-8", path);
            continue;
        };
        if name.starts_with('.') {
            debug!("Skipping hidden entry {:?}", path);
            continue;
        }
        let is_dir = runtime.is_dir(&path);
        match (kind, is_dir) {
            (Kind::Dir, true) | (Kind::File, false) => found.push((decode_segment(name), path)),
            (Kind::Dir, false) => debug!("Skipping {:?}: expected a directory", path),
            (Kind::File, true) => debug!("Skipping {:?}: expected an artifact file", path),
        }
    }
    Ok(found)
}

/// Like [`entries`] below the root: an unreadable directory is skipped so
/// one bad entry does not hide the rest of the scan.
fn nested<R: Runtime>(runtime: &R, dir: &Path, kind: Kind) -> Vec<(String, PathBuf)> {
    entries(runtime, dir, kind).unwrap_or_else(|e| {
        debug!("Skipping {:?}: {:#}", dir, e);
        Vec::new()
    })
}

/// Every artifact staged under `<store>/<site>/<owner>/<repo>/<version>/`.
#[tracing::instrument(skip(runtime, layout))]
pub fn list_installed<R: Runtime>(runtime: &R, layout: &StoreLayout) -> Result<Vec<ResolvedAsset>> {
    let root = layout.store_root();
    if !runtime.is_dir(root) {
        debug!("Store root {:?} does not exist", root);
        return Ok(vec![]);
    }
    check_marker(runtime, root)?;

    let mut installed = Vec::new();
    for (site, site_dir) in entries(runtime, root, Kind::Dir)? {
        for (owner, owner_dir) in nested(runtime, &site_dir, Kind::Dir) {
            for (repository, repo_dir) in nested(runtime, &owner_dir, Kind::Dir) {
                for (version, version_dir) in nested(runtime, &repo_dir, Kind::Dir) {
                    for (artifact_name, path) in nested(runtime, &version_dir, Kind::File) {
                        installed.push(ResolvedAsset {
                            site: site.clone(),
                            owner: owner.clone(),
                            repository: repository.clone(),
                            version: version.clone(),
                            artifact_name,
                            local_path: Some(path),
                            ..Default::default()
                        });
                    }
                }
            }
        }
    }
    Ok(installed)
}

/// Symlinks directly under the bin root whose target is inside the store.
#[tracing::instrument(skip(runtime, layout))]
pub fn list_linked<R: Runtime>(runtime: &R, layout: &StoreLayout) -> Result<Vec<LinkedAsset>> {
    let bin = layout.bin_root();
    if !runtime.is_dir(bin) {
        debug!("Bin root {:?} does not exist", bin);
        return Ok(vec![]);
    }

    let mut linked = Vec::new();
    for link in runtime.read_dir(bin)? {
        let hidden = link
            .file_name()
            .and_then(|n| n.to_str())
            .is_none_or(|n| n.starts_with('.'));
        if hidden || !runtime.is_symlink(&link) {
            continue;
        }
        let target = match runtime.resolve_link(&link) {
            Ok(target) => target,
            Err(e) => {
                debug!("Skipping {:?}: {:#}", link, e);
                continue;
            }
        };
        if is_path_under(&target, layout.store_root()) {
            linked.push(LinkedAsset { link, target });
        } else {
            debug!("Ignoring {:?}: {:?} is outside the store", link, target);
        }
    }
    Ok(linked)
}
