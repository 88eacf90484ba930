//! Path derivation for the store and bin roots.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::error::GpmError;
use crate::resolver::ResolvedAsset;
use crate::runtime::Runtime;

/// File at the store root recording the layout version.
pub const LAYOUT_MARKER: &str = ".gpm-layout";
pub const LAYOUT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    store_root: PathBuf,
    bin_root: PathBuf,
}

impl StoreLayout {
    pub fn new(store_root: impl Into<PathBuf>, bin_root: impl Into<PathBuf>) -> Self {
        Self {
            store_root: store_root.into(),
            bin_root: bin_root.into(),
        }
    }

    pub fn store_root(&self) -> &Path {
        &self.store_root
    }

    pub fn bin_root(&self) -> &Path {
        &self.bin_root
    }

    /// `<store>/<site>/<owner>/<repository>/<version>/<artifact>`
    pub fn artifact_path(&self, asset: &ResolvedAsset) -> PathBuf {
        [
            &asset.site,
            &asset.owner,
            &asset.repository,
            &asset.version,
            &asset.artifact_name,
        ]
        .iter()
        .fold(self.store_root.clone(), |path, segment| {
            path.join(encode_segment(segment))
        })
    }

    /// `<bin>/<name>`, where the name is the override, the asset's link
    /// name, or its repository, in that order.
    pub fn link_path(&self, asset: &ResolvedAsset, name_override: Option<&str>) -> PathBuf {
        let name = name_override
            .or(asset.link_name.as_deref())
            .unwrap_or(&asset.repository);
        self.bin_root.join(name)
    }
}

/// Escape a field so it is exactly one visible path component. Tags may
/// contain `/`, and a leading `.` would hide the entry from the scanner.
pub fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for (i, c) in segment.chars().enumerate() {
        match c {
            '%' => encoded.push_str("%25"),
            '/' => encoded.push_str("%2F"),
            '\\' => encoded.push_str("%5C"),
            '.' if i == 0 => encoded.push_str("%2E"),
            c => encoded.push(c),
        }
    }
    encoded
}

pub fn decode_segment(segment: &str) -> String {
    let mut decoded = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(i) = rest.find('%') {
        decoded.push_str(&rest[..i]);
        let escape = rest.get(i..i + 3);
        let c = match escape {
            Some("%25") => Some('%'),
            Some("%2F") => Some('/'),
            Some("%5C") => Some('\\'),
            Some("%2E") => Some('.'),
            _ => None,
        };
        match c {
            Some(c) => {
                decoded.push(c);
                rest = &rest[i + 3..];
            }
            None => {
                decoded.push('%');
                rest = &rest[i + 1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

/// Write the layout marker if the store does not carry one yet.
#[tracing::instrument(skip(runtime))]
pub fn ensure_marker<R: Runtime>(runtime: &R, store_root: &Path) -> Result<()> {
    let marker = store_root.join(LAYOUT_MARKER);
    if runtime.exists(&marker) {
        return check_marker(runtime, store_root);
    }
    debug!("Writing layout marker {:?}", marker);
    runtime.create_dir_all(store_root)?;
    runtime
        .write(&marker, format!("{}\n", LAYOUT_VERSION).as_bytes())
        .context("Failed to write the store layout marker")
}

/// Fail with [`GpmError::LayoutMismatch`] when the store was written by an
/// incompatible layout. A store without a marker counts as the current one.
#[tracing::instrument(skip(runtime))]
pub fn check_marker<R: Runtime>(runtime: &R, store_root: &Path) -> Result<()> {
    let marker = store_root.join(LAYOUT_MARKER);
    if !runtime.exists(&marker) {
        return Ok(());
    }
    let found = runtime.read_to_string(&marker)?;
    let found = found.trim();
    if found.parse::<u32>().ok() != Some(LAYOUT_VERSION) {
        return Err(GpmError::LayoutMismatch {
            root: store_root.to_path_buf(),
            found: found.to_string(),
            expected: LAYOUT_VERSION,
        }
        .into());
    }
    Ok(())
}
