//! `.helmignore` maintenance
//!
//! Charts in the repo share one `.gitignore` at the charts root. Its patterns
//! are merged into each chart's `.helmignore` before packaging so build
//! leftovers never end up inside an archive.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Result;

pub const HELMIGNORE_FILE: &str = ".helmignore";
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Non-empty, non-comment lines of an ignore file
pub fn ignore_patterns(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Outcome of a sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No `.gitignore` at the charts root
    NoGitignore,
    /// `.helmignore` rewritten with this many patterns
    Updated { patterns: usize },
}

/// Merge `<charts_root>/.gitignore` into `<chart_dir>/.helmignore`
///
/// The result is the sorted union of both pattern sets. Comments in the
/// existing `.helmignore` are not preserved.
pub fn sync_helmignore(charts_root: &Path, chart_dir: &Path) -> Result<SyncOutcome> {
    let gitignore = charts_root.join(GITIGNORE_FILE);
    if !gitignore.is_file() {
        tracing::warn!(
            "{} not found - skipping pattern sync",
            gitignore.display()
        );
        return Ok(SyncOutcome::NoGitignore);
    }

    let helmignore = chart_dir.join(HELMIGNORE_FILE);
    let mut patterns = if helmignore.is_file() {
        ignore_patterns(&std::fs::read_to_string(&helmignore)?)
    } else {
        BTreeSet::new()
    };
    patterns.extend(ignore_patterns(&std::fs::read_to_string(&gitignore)?));

    let mut out = String::new();
    for pattern in &patterns {
        out.push_str(pattern);
        out.push('\n');
    }
    std::fs::write(&helmignore, out)?;

    tracing::debug!("Wrote {} patterns to {}", patterns.len(), helmignore.display());
    Ok(SyncOutcome::Updated {
        patterns: patterns.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ignore_patterns() {
        let patterns = ignore_patterns("# comment\n*.tgz\n\n  .DS_Store \n*.tgz\n");
        assert_eq!(
            patterns.into_iter().collect::<Vec<_>>(),
            vec!["*.tgz", ".DS_Store"]
        );
    }

    #[test]
    fn test_sync_merges_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let chart = tmp.path().join("nginx");
        std::fs::create_dir(&chart).unwrap();
        std::fs::write(tmp.path().join(GITIGNORE_FILE), "# build\n*.tgz\ncharts/\n").unwrap();
        std::fs::write(chart.join(HELMIGNORE_FILE), "# vcs\n.git/\n*.tgz\n").unwrap();

        let outcome = sync_helmignore(tmp.path(), &chart).unwrap();
        assert_eq!(outcome, SyncOutcome::Updated { patterns: 3 });

        let written = std::fs::read_to_string(chart.join(HELMIGNORE_FILE)).unwrap();
        assert_eq!(written, "*.tgz\n.git/\ncharts/\n");
    }

    #[test]
    fn test_sync_without_gitignore() {
        let tmp = TempDir::new().unwrap();
        let chart = tmp.path().join("nginx");
        std::fs::create_dir(&chart).unwrap();

        let outcome = sync_helmignore(tmp.path(), &chart).unwrap();
        assert_eq!(outcome, SyncOutcome::NoGitignore);
        assert!(!chart.join(HELMIGNORE_FILE).exists());
    }
}
