//! Semantic version selection over release tags.

use log::debug;
use semver::Version;

use crate::provider::Release;

/// How a reference's version field selects a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// Greatest tag by semver precedence.
    Highest,
    /// Whatever the forge designates as the latest release.
    Latest,
    /// Exactly this tag.
    Tag(String),
}

impl VersionSelector {
    pub fn parse(version: &str) -> Self {
        match version {
            "" | "highest" => VersionSelector::Highest,
            "latest" => VersionSelector::Latest,
            tag => VersionSelector::Tag(tag.to_string()),
        }
    }
}

/// Parse a release tag as semver, tolerating a leading `v`.
pub fn parse_tag(tag: &str) -> Option<Version> {
    Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}

/// The release with the greatest parseable tag. Tags that are not semver
/// are skipped; on equal precedence the first listed release wins.
pub fn highest(releases: &[Release]) -> Option<&Release> {
    let mut best: Option<(&Release, Version)> = None;

    for release in releases {
        let Some(version) = parse_tag(&release.tag) else {
            debug!("Skipping release {:?}: tag is not a semantic version", release.tag);
            continue;
        };
        match &best {
            Some((_, current)) if version <= *current => {}
            _ => best = Some((release, version)),
        }
    }

    best.map(|(release, _)| release)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn releases(tags: &[&str]) -> Vec<Release> {
        tags.iter()
            .enumerate()
            .map(|(i, tag)| Release {
                id: i as u64 + 1,
                tag: tag.to_string(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!(VersionSelector::parse(""), VersionSelector::Highest);
        assert_eq!(VersionSelector::parse("highest"), VersionSelector::Highest);
        assert_eq!(VersionSelector::parse("latest"), VersionSelector::Latest);
        assert_eq!(
            VersionSelector::parse("v1.2.3"),
            VersionSelector::Tag("v1.2.3".into())
        );
    }

    #[test]
    fn test_highest_uses_semver_precedence() {
        let releases = releases(&["v1.2.0", "v1.10.0", "v1.2.1"]);
        assert_eq!(highest(&releases).unwrap().tag, "v1.10.0");
    }

    #[test]
    fn test_highest_skips_unparseable_tags() {
        let releases = releases(&["nightly", "1.0.0", "v0.9.0", "release-2"]);
        assert_eq!(highest(&releases).unwrap().tag, "1.0.0");
    }

    #[test]
    fn test_highest_none_parseable() {
        assert!(highest(&releases(&["not-a-version"])).is_none());
        assert!(highest(&[]).is_none());
    }

    #[test]
    fn test_prerelease_sorts_below_release() {
        let releases = releases(&["v2.0.0-rc.1", "v2.0.0", "v2.0.0-beta"]);
        assert_eq!(highest(&releases).unwrap().tag, "v2.0.0");
    }

    #[test]
    fn test_equal_precedence_keeps_first() {
        let releases = releases(&["v1.0.0", "1.0.0"]);
        assert_eq!(highest(&releases).unwrap().id, 1);
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("v1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_tag("1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_tag("v1.2"), None);
    }
}
