//! Chart version bumping

use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::chart::{CHART_FILE, LoadedChart};
use crate::error::{CoreError, Result};

/// Which SemVer component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Patch,
    Minor,
    Major,
}

impl FromStr for BumpKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "patch" => Ok(BumpKind::Patch),
            "minor" => Ok(BumpKind::Minor),
            "major" => Ok(BumpKind::Major),
            other => Err(CoreError::UnknownBump(other.to_string())),
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BumpKind::Patch => "patch",
            BumpKind::Minor => "minor",
            BumpKind::Major => "major",
        };
        f.write_str(s)
    }
}

/// Increment one component and zero everything below it
///
/// Pre-release and build metadata are dropped.
pub fn bump_version(version: &Version, kind: BumpKind) -> Version {
    let mut next = match kind {
        BumpKind::Major => Version::new(version.major + 1, 0, 0),
        BumpKind::Minor => Version::new(version.major, version.minor + 1, 0),
        BumpKind::Patch => Version::new(version.major, version.minor, version.patch + 1),
    };
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;
    next
}

/// Replace the top-level `version:` value in Chart.yaml text
///
/// Only that line changes; comments, quoting and key order are kept.
pub fn rewrite_version(content: &str, new_version: &Version) -> Option<String> {
    // Indented `version:` keys belong to dependencies and must be left alone.
    let re = Regex::new(r#"(?m)^version:(?P<ws>[ \t]*)(?P<q>["']?)[^"'\s#]+["']?(?P<rest>[^\n]*)$"#)
        .ok()?;

    if !re.is_match(content) {
        return None;
    }

    let replaced = re.replacen(content, 1, |caps: &regex::Captures<'_>| {
        let ws = if caps["ws"].is_empty() { " " } else { &caps["ws"] };
        format!(
            "version:{}{}{}{}{}",
            ws, &caps["q"], new_version, &caps["q"], &caps["rest"]
        )
    });

    Some(replaced.into_owned())
}

/// Result of bumping a chart on disk
#[derive(Debug, Clone)]
pub struct BumpResult {
    pub chart: String,
    pub previous: Version,
    pub current: Version,
}

/// Bump a chart's version and write it back to Chart.yaml
pub fn bump_chart(chart_dir: &Path, kind: BumpKind) -> Result<BumpResult> {
    let chart = LoadedChart::load(chart_dir)?;
    let previous = chart.metadata.version.clone();
    let current = bump_version(&previous, kind);

    let path = chart_dir.join(CHART_FILE);
    let content = std::fs::read_to_string(&path)?;
    let updated = rewrite_version(&content, &current).ok_or_else(|| {
        CoreError::VersionFieldMissing {
            path: path.display().to_string(),
        }
    })?;
    std::fs::write(&path, updated)?;

    tracing::info!("Bumped {} from {} to {} ({})", chart.metadata.name, previous, current, kind);

    Ok(BumpResult {
        chart: chart.metadata.name,
        previous,
        current,
    })
}
