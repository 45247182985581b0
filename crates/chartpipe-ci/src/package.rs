//! Chart packaging

use std::path::PathBuf;

use chartpipe_core::{ChartsDir, SyncOutcome, sync_helmignore};

use crate::error::{CiError, Result};
use crate::helm::HelmClient;

/// A packaged chart archive
#[derive(Debug, Clone)]
pub struct PackageReport {
    pub chart: String,
    pub version: semver::Version,
    pub path: PathBuf,
    pub size: u64,
    pub dependencies_built: bool,
    pub helmignore: SyncOutcome,
}

pub struct Packager<'a> {
    helm: HelmClient<'a>,
    charts: ChartsDir,
    packages_dir: PathBuf,
}

impl<'a> Packager<'a> {
    pub fn new(helm: HelmClient<'a>, charts: ChartsDir, packages_dir: impl Into<PathBuf>) -> Self {
        Self {
            helm,
            charts,
            packages_dir: packages_dir.into(),
        }
    }

    /// Where the archive for `name`-`version` is expected
    pub fn archive_path(&self, archive_name: &str) -> PathBuf {
        self.packages_dir.join(archive_name)
    }

    /// Package one chart into the packages directory
    pub fn package(&self, name: &str) -> Result<PackageReport> {
        let chart = self.charts.load(name)?;
        chart.check_name()?;
        let meta = &chart.metadata;
        tracing::info!("Packaging {} {}", meta.name, meta.version);

        let helmignore = sync_helmignore(self.charts.root(), &chart.root)?;

        std::fs::create_dir_all(&self.packages_dir)?;
        tracing::debug!("Packages directory: {}", self.packages_dir.display());

        let dependencies_built = if meta.has_dependencies() {
            self.helm.dependency_build(&chart.root)?;
            true
        } else {
            tracing::debug!("No dependencies to build");
            false
        };

        self.helm.package(&chart.root, &self.packages_dir)?;

        let path = self.archive_path(&meta.archive_name());
        let size = match std::fs::metadata(&path) {
            Ok(m) if m.is_file() => m.len(),
            _ => {
                return Err(CiError::PackageMissing {
                    path: path.display().to_string(),
                });
            }
        };

        Ok(PackageReport {
            chart: meta.name.clone(),
            version: meta.version.clone(),
            path,
            size,
            dependencies_built,
            helmignore,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{MockRunner, ToolOutput};
    use tempfile::TempDir;

    fn fixture(chart_yaml: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("charts").join("nginx");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Chart.yaml"), chart_yaml).unwrap();
        std::fs::write(tmp.path().join("charts").join(".gitignore"), "*.tgz\n").unwrap();
        tmp
    }

    #[test]
    fn test_package_verifies_archive() {
        let tmp = fixture("name: nginx\nversion: 1.2.0\n");
        let packages = tmp.path().join(".packages");
        let mock = MockRunner::new();
        let packager = Packager::new(
            HelmClient::new(&mock, "helm"),
            ChartsDir::new(tmp.path().join("charts")),
            &packages,
        );

        // helm is mocked, so nothing gets written
        let err = packager.package("nginx").unwrap_err();
        assert!(matches!(err, CiError::PackageMissing { .. }));
        assert!(packages.is_dir());

        std::fs::write(packages.join("nginx-1.2.0.tgz"), vec![0u8; 2048]).unwrap();
        let report = packager.package("nginx").unwrap();
        assert_eq!(report.size, 2048);
        assert_eq!(report.path, packages.join("nginx-1.2.0.tgz"));
        assert!(!report.dependencies_built);
        assert_eq!(report.helmignore, SyncOutcome::Updated { patterns: 1 });
        assert_eq!(mock.count("helm", &["package"]), 2);
        assert_eq!(mock.count("helm", &["dependency"]), 0);
    }

    #[test]
    fn test_dependencies_built_before_package() {
        let tmp = fixture("name: nginx\nversion: 1.2.0\ndependencies:\n  - name: common\n");
        let packages = tmp.path().join(".packages");
        std::fs::create_dir_all(&packages).unwrap();
        std::fs::write(packages.join("nginx-1.2.0.tgz"), b"tgz").unwrap();

        let mock = MockRunner::new();
        let packager = Packager::new(
            HelmClient::new(&mock, "helm"),
            ChartsDir::new(tmp.path().join("charts")),
            &packages,
        );

        let report = packager.package("nginx").unwrap();
        assert!(report.dependencies_built);

        let lines = mock.command_lines();
        assert!(lines[0].starts_with("helm dependency build"));
        assert!(lines[1].starts_with("helm package"));
        assert!(lines[1].ends_with(&format!("-d {}", packages.display())));
    }

    #[test]
    fn test_package_failure_surfaces() {
        let tmp = fixture("name: nginx\nversion: 1.2.0\n");
        let mock = MockRunner::new();
        mock.on("helm", &["package"], ToolOutput::failed(1, "Error: chart.metadata.name is required"));
        let packager = Packager::new(
            HelmClient::new(&mock, "helm"),
            ChartsDir::new(tmp.path().join("charts")),
            tmp.path().join(".packages"),
        );

        let err = packager.package("nginx").unwrap_err();
        assert!(matches!(err, CiError::ToolFailed { .. }));
    }

    #[test]
    fn test_name_mismatch_not_packaged() {
        let tmp = fixture("name: web\nversion: 1.2.0\n");
        let mock = MockRunner::new();
        let packager = Packager::new(
            HelmClient::new(&mock, "helm"),
            ChartsDir::new(tmp.path().join("charts")),
            tmp.path().join(".packages"),
        );

        let err = packager.package("nginx").unwrap_err();
        assert!(matches!(
            err,
            CiError::Chart(chartpipe_core::CoreError::NameMismatch { ref declared, .. })
                if declared == "web"
        ));
        assert!(mock.calls().is_empty());
        assert!(!tmp.path().join(".packages").exists());
    }

    #[test]
    fn test_prefixed_version_rejected_before_helm() {
        let tmp = fixture("name: nginx\nversion: v1.2.0\n");
        let mock = MockRunner::new();
        let packager = Packager::new(
            HelmClient::new(&mock, "helm"),
            ChartsDir::new(tmp.path().join("charts")),
            tmp.path().join(".packages"),
        );

        let err = packager.package("nginx").unwrap_err();
        assert!(matches!(
            err,
            CiError::Chart(chartpipe_core::CoreError::InvalidChart { .. })
        ));
        assert!(mock.calls().is_empty());
    }
}
