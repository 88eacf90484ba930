//! Picks the artifact of a release that fits the current platform.

use crate::platform::Platform;
use crate::provider::ReleaseAsset;

/// Files published next to executables that are never worth installing:
/// checksums, signatures, metadata, scripts and man pages.
const AUXILIARY_SUFFIXES: &[&str] = &[
    ".txt",
    ".sha256",
    ".md5",
    ".shasum",
    ".sig",
    ".sha1",
    ".sha512",
    ".sha256sum",
    ".asc",
    ".json",
    ".yaml",
    ".sh",
    ".1",
    ".2",
    ".3",
    ".5",
    ".6",
    ".7",
    ".8",
    ".vsix",
];

pub fn is_auxiliary(name: &str) -> bool {
    let name = name.to_lowercase();
    AUXILIARY_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// C library an artifact is linked against, as spelled in its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Libc {
    Gnu,
    Musl,
}

impl Libc {
    /// Whether `name` may be built for this libc. Names that mention
    /// neither are accepted.
    pub fn accepts(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        match self {
            Libc::Gnu => !name.contains("musl"),
            Libc::Musl => !name.contains("gnu"),
        }
    }
}

/// Filters and tie-break applied when several artifacts are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Longest extension (characters after the last dot) a preferred
    /// artifact may have. Names without a dot count as length 0.
    pub max_extension_len: usize,
    /// Only keep artifacts built for this libc.
    pub libc: Option<Libc>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_extension_len: 4,
            libc: None,
        }
    }
}

/// Outcome of picking an artifact.
#[derive(Debug, PartialEq, Eq)]
pub enum Pick<'a> {
    Selected(&'a ReleaseAsset),
    /// The release has no artifacts at all.
    Empty,
    /// No installable artifact names both the OS and the architecture
    /// (and fits the wanted libc).
    NoMatch,
    /// Several platform matches and none passes the tie-break.
    Ambiguous(Vec<&'a ReleaseAsset>),
}

fn extension_len(name: &str) -> usize {
    name.rfind('.').map(|i| name.len() - i - 1).unwrap_or(0)
}

pub fn pick<'a>(
    assets: &'a [ReleaseAsset],
    platform: &Platform,
    policy: &SelectionPolicy,
) -> Pick<'a> {
    match assets {
        [] => return Pick::Empty,
        [only] => return Pick::Selected(only),
        _ => {}
    }

    let candidates: Vec<&ReleaseAsset> = assets
        .iter()
        .filter(|a| !is_auxiliary(&a.name))
        .filter(|a| platform.matches(&a.name))
        .filter(|a| policy.libc.is_none_or(|libc| libc.accepts(&a.name)))
        .collect();

    match candidates.len() {
        0 => return Pick::NoMatch,
        1 => return Pick::Selected(candidates[0]),
        _ => {}
    }

    let preferred = candidates
        .iter()
        .copied()
        .find(|a| extension_len(&a.name) <= policy.max_extension_len);
    match preferred {
        Some(asset) => Pick::Selected(asset),
        None => Pick::Ambiguous(candidates),
    }
}
