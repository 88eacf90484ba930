//! Symlink operations (create, inspect, resolve).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;
use super::path::normalize_path;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(original, link)
                .with_context(|| format!("Failed to create symlink {:?} -> {:?}", link, original))?;
        }
        #[cfg(windows)]
        {
            std::os::windows::fs::symlink_file(original, link)
                .with_context(|| format!("Failed to create symlink {:?} -> {:?}", link, original))?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn resolve_link_impl(&self, path: &Path) -> Result<PathBuf> {
        let target = fs::read_link(path).with_context(|| format!("Failed to read symlink {:?}", path))?;
        if target.is_absolute() {
            return Ok(target);
        }
        let parent = path
            .parent()
            .context("Failed to get parent directory of symlink")?;
        Ok(normalize_path(&parent.join(target)))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_symlink_absolute_target() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        runtime.write(&target, b"x").unwrap();

        runtime.symlink(&target, &link).unwrap();

        assert!(runtime.is_symlink(&link));
        assert!(!runtime.is_symlink(&target));
        assert_eq!(runtime.resolve_link(&link).unwrap(), target);
    }

    #[test]
    fn test_resolve_relative_target() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        runtime.create_dir_all(&bin).unwrap();
        let link = bin.join("tool");

        runtime
            .symlink(Path::new("../store/tool"), &link)
            .unwrap();

        assert_eq!(
            runtime.resolve_link(&link).unwrap(),
            dir.path().join("store/tool")
        );
    }

    #[test]
    fn test_dangling_symlink_is_still_a_symlink() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let link = dir.path().join("dangling");

        runtime
            .symlink(&dir.path().join("missing"), &link)
            .unwrap();

        assert!(runtime.is_symlink(&link));
        assert!(!runtime.exists(&link));
    }

    #[test]
    fn test_resolve_link_on_regular_file_fails() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain");
        runtime.write(&file, b"x").unwrap();

        assert!(runtime.resolve_link(&file).is_err());
    }
}
