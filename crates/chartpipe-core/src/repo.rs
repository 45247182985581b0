//! Chart discovery inside a charts directory
//!
//! A charts directory holds one chart per top-level subdirectory:
//!
//! ```text
//! charts/
//! ├── .gitignore
//! ├── nginx/
//! │   ├── Chart.yaml
//! │   └── values.yaml
//! └── postgres/
//!     └── Chart.yaml
//! ```

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::chart::{CHART_FILE, LoadedChart};
use crate::error::{CoreError, Result};

/// A directory containing charts, one per subdirectory
#[derive(Debug, Clone)]
pub struct ChartsDir {
    root: PathBuf,
}

impl ChartsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A name is a chart if it is not hidden and its directory holds a `Chart.yaml`
    pub fn is_chart(&self, name: &str) -> bool {
        if name.is_empty() || name.starts_with('.') {
            return false;
        }

        let path = self.root.join(name);
        path.is_dir() && path.join(CHART_FILE).is_file()
    }

    /// Resolve a chart name to its directory
    pub fn chart_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name);

        if !path.is_dir() {
            return Err(CoreError::ChartNotFound {
                path: path.display().to_string(),
            });
        }
        if !path.join(CHART_FILE).is_file() {
            return Err(CoreError::ChartYamlMissing {
                path: path.display().to_string(),
            });
        }

        Ok(path)
    }

    /// Load a chart by name
    pub fn load(&self, name: &str) -> Result<LoadedChart> {
        LoadedChart::load(self.chart_path(name)?)
    }

    /// All chart names, sorted
    pub fn all(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            tracing::warn!("Charts directory not found: {}", self.root.display());
            return Ok(Vec::new());
        }

        let mut charts = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.is_chart(&name) {
                charts.push(name);
            }
        }

        charts.sort();
        Ok(charts)
    }

    /// Map changed repository paths to the set of charts they touch
    ///
    /// `paths` are relative to the repository root, as printed by
    /// `git diff --name-only`. Only files below `<charts_dir>/<chart>/` whose
    /// `<chart>` is a valid chart are counted.
    pub fn charts_for_paths<I, S>(&self, paths: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefix = normalize(&self.root);
        let mut charts = BTreeSet::new();

        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                continue;
            }

            let parts = normalize(Path::new(path));
            if parts.len() <= prefix.len() + 1 || !parts.starts_with(&prefix) {
                continue;
            }

            let name = &parts[prefix.len()];
            if self.is_chart(name) {
                charts.insert(name.clone());
            } else {
                tracing::debug!("Ignoring non-chart change: {}", path);
            }
        }

        charts
    }
}

fn normalize(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Parse a chart list file: one name per line, blanks ignored
pub fn parse_chart_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a chart list file
pub fn read_chart_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_chart_list(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn charts_fixture(names: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let charts = tmp.path().join("charts");
        std::fs::create_dir(&charts).unwrap();
        for name in names {
            let dir = charts.join(name);
            std::fs::create_dir(&dir).unwrap();
            std::fs::write(
                dir.join(CHART_FILE),
                format!("name: {}\nversion: 1.0.0\n", name),
            )
            .unwrap();
        }
        std::fs::create_dir(charts.join("not-a-chart")).unwrap();
        std::fs::write(charts.join(".gitignore"), "*.tgz\n").unwrap();
        tmp
    }

    #[test]
    fn test_is_chart() {
        let tmp = charts_fixture(&["my-chart"]);
        let dir = ChartsDir::new(tmp.path().join("charts"));

        assert!(dir.is_chart("my-chart"));
        assert!(!dir.is_chart("not-a-chart"));
        assert!(!dir.is_chart(".gitignore"));
        assert!(!dir.is_chart(""));
        assert!(!dir.is_chart("missing"));
    }

    #[test]
    fn test_all_sorted() {
        let tmp = charts_fixture(&["chart-c", "chart-a", "chart-b"]);
        let dir = ChartsDir::new(tmp.path().join("charts"));

        assert_eq!(dir.all().unwrap(), vec!["chart-a", "chart-b", "chart-c"]);
    }

    #[test]
    fn test_all_missing_root() {
        let tmp = TempDir::new().unwrap();
        let dir = ChartsDir::new(tmp.path().join("nope"));
        assert!(dir.all().unwrap().is_empty());
    }

    #[test]
    fn test_chart_path_errors() {
        let tmp = charts_fixture(&["app"]);
        let dir = ChartsDir::new(tmp.path().join("charts"));

        assert!(dir.chart_path("app").is_ok());
        assert!(matches!(
            dir.chart_path("not-a-chart"),
            Err(CoreError::ChartYamlMissing { .. })
        ));
        assert!(matches!(
            dir.chart_path("ghost"),
            Err(CoreError::ChartNotFound { .. })
        ));
    }

    #[test]
    fn test_charts_for_paths() {
        let tmp = charts_fixture(&["nginx", "postgres", "redis"]);
        // Paths are resolved relative to the charts dir as given, so use the
        // absolute root both for lookup and for the changed paths.
        let root = tmp.path().join("charts");
        let dir = ChartsDir::new(&root);
        let root_str = root.display().to_string();

        let changed = vec![
            format!("{}/nginx/values.yaml", root_str),
            format!("{}/nginx/templates/deployment.yaml", root_str),
            format!("{}/postgres/Chart.yaml", root_str),
            format!("{}/not-a-chart/README.md", root_str),
            format!("{}/.gitignore", root_str),
            "docs/README.md".to_string(),
            "Makefile".to_string(),
            String::new(),
        ];

        let charts = dir.charts_for_paths(&changed);
        assert_eq!(
            charts.into_iter().collect::<Vec<_>>(),
            vec!["nginx", "postgres"]
        );
    }

    #[test]
    fn test_charts_for_paths_empty() {
        let tmp = charts_fixture(&["nginx"]);
        let dir = ChartsDir::new(tmp.path().join("charts"));
        assert!(dir.charts_for_paths(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_parse_chart_list() {
        let list = parse_chart_list("nginx\n\n  postgres  \n\n");
        assert_eq!(list, vec!["nginx", "postgres"]);
        assert!(parse_chart_list("").is_empty());
    }
}
