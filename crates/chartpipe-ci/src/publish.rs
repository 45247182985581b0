//! Idempotent publishing to an OCI registry
//!
//! A tag is created once and never overwritten: if `(name, version)` is
//! already in the registry the push is skipped and reported as success, so a
//! pipeline can be re-run safely. Concurrent duplicate pushes are left to the
//! registry's own first-writer-wins tag semantics.

use std::path::PathBuf;

use chartpipe_core::ChartsDir;

use crate::config::{RegistryCredentials, RegistryTarget};
use crate::error::{CiError, Result};
use crate::helm::HelmClient;

/// What publishing did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Pushed a new tag
    Published { reference: String },
    /// Tag already present, nothing pushed
    AlreadyPublished { reference: String },
}

impl PublishOutcome {
    pub fn reference(&self) -> &str {
        match self {
            PublishOutcome::Published { reference }
            | PublishOutcome::AlreadyPublished { reference } => reference,
        }
    }

    pub fn was_pushed(&self) -> bool {
        matches!(self, PublishOutcome::Published { .. })
    }
}

pub struct Publisher<'a> {
    helm: HelmClient<'a>,
    charts: ChartsDir,
    packages_dir: PathBuf,
    target: RegistryTarget,
}

impl<'a> Publisher<'a> {
    pub fn new(
        helm: HelmClient<'a>,
        charts: ChartsDir,
        packages_dir: impl Into<PathBuf>,
        target: RegistryTarget,
    ) -> Self {
        Self {
            helm,
            charts,
            packages_dir: packages_dir.into(),
            target,
        }
    }

    pub fn target(&self) -> &RegistryTarget {
        &self.target
    }

    /// Log in to the registry with `helm registry login`
    pub fn login(&self, credentials: &RegistryCredentials) -> Result<()> {
        tracing::info!("Logging in to {} as {}", credentials.host, credentials.username);
        let output = self.helm.registry_login(
            &credentials.host,
            &credentials.username,
            &credentials.password,
        )?;

        if output.success() {
            Ok(())
        } else {
            Err(CiError::LoginFailed {
                host: credentials.host.clone(),
                stderr: output.stderr,
            })
        }
    }

    /// Publish the packaged archive of `name`, skipping existing tags
    pub fn publish(&self, name: &str) -> Result<PublishOutcome> {
        let chart = self.charts.load(name)?;
        chart.check_name()?;
        let meta = &chart.metadata;
        let version = meta.version.to_string();

        let package = self.packages_dir.join(meta.archive_name());
        if !package.is_file() {
            return Err(CiError::PackageMissing {
                path: package.display().to_string(),
            });
        }

        let reference = self.target.chart_reference(&meta.name, &version);
        tracing::info!("Checking if {} exists in registry", reference);

        if self
            .helm
            .chart_exists(&self.target.oci_url(), &meta.name, &version)?
        {
            tracing::warn!(
                "{} already exists in registry - skipping push to prevent overwrite",
                reference
            );
            return Ok(PublishOutcome::AlreadyPublished { reference });
        }

        tracing::info!("Pushing {} to {}", package.display(), self.target);
        let output = self.helm.push(&package, &self.target.oci_url())?;
        if !output.success() {
            return Err(CiError::PushFailed {
                reference,
                stderr: output.stderr,
            });
        }

        Ok(PublishOutcome::Published { reference })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{MockRunner, ToolOutput};
    use tempfile::TempDir;

    const REGISTRY: &str = "oci://registry.example.com/homelab/helm-charts";

    fn fixture(with_package: bool) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("charts").join("nginx");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Chart.yaml"), "name: nginx\nversion: 1.0.0\n").unwrap();
        if with_package {
            let packages = tmp.path().join(".packages");
            std::fs::create_dir_all(&packages).unwrap();
            std::fs::write(packages.join("nginx-1.0.0.tgz"), b"tgz").unwrap();
        }
        tmp
    }

    fn publisher<'a>(mock: &'a MockRunner, tmp: &TempDir) -> Publisher<'a> {
        Publisher::new(
            HelmClient::new(mock, "helm"),
            ChartsDir::new(tmp.path().join("charts")),
            tmp.path().join(".packages"),
            RegistryTarget::parse(REGISTRY).unwrap(),
        )
    }

    #[test]
    fn test_publish_new_version() {
        let tmp = fixture(true);
        let mock = MockRunner::new();
        mock.on("helm", &["show", "chart"], ToolOutput::failed(1, "not found"));

        let outcome = publisher(&mock, &tmp).publish("nginx").unwrap();
        assert_eq!(
            outcome,
            PublishOutcome::Published {
                reference: "registry.example.com/homelab/helm-charts/nginx:1.0.0".into()
            }
        );
        assert!(outcome.was_pushed());

        let lines = mock.command_lines();
        assert_eq!(
            lines[0],
            format!("helm show chart {}/nginx --version 1.0.0", REGISTRY)
        );
        assert!(lines[1].starts_with("helm push"));
        assert!(lines[1].ends_with(REGISTRY));
    }

    #[test]
    fn test_existing_tag_is_noop() {
        let tmp = fixture(true);
        let mock = MockRunner::new();
        mock.on("helm", &["show", "chart"], ToolOutput::ok("name: nginx\nversion: 1.0.0\n"));
        let publisher = publisher(&mock, &tmp);

        for _ in 0..2 {
            let outcome = publisher.publish("nginx").unwrap();
            assert!(matches!(outcome, PublishOutcome::AlreadyPublished { .. }));
        }
        assert_eq!(mock.count("helm", &["push"]), 0);
    }

    #[test]
    fn test_rerun_after_publish_is_noop() {
        let tmp = fixture(true);
        let mock = MockRunner::new();
        mock.on("helm", &["show", "chart"], ToolOutput::failed(1, "not found"));
        let publisher = publisher(&mock, &tmp);

        assert!(publisher.publish("nginx").unwrap().was_pushed());

        // The registry now has the tag
        mock.on("helm", &["show", "chart"], ToolOutput::ok("name: nginx"));
        assert!(!publisher.publish("nginx").unwrap().was_pushed());
        assert_eq!(mock.count("helm", &["push"]), 1);
    }

    #[test]
    fn test_push_failure_not_retried() {
        let tmp = fixture(true);
        let mock = MockRunner::new();
        mock.on("helm", &["show", "chart"], ToolOutput::failed(1, "not found"));
        mock.on("helm", &["push"], ToolOutput::failed(1, "unauthorized: authentication required"));

        let err = publisher(&mock, &tmp).publish("nginx").unwrap_err();
        assert!(matches!(err, CiError::PushFailed { .. }));
        assert_eq!(err.tool_stderr(), Some("unauthorized: authentication required"));
        assert_eq!(mock.count("helm", &["push"]), 1);
    }

    #[test]
    fn test_missing_package() {
        let tmp = fixture(false);
        let mock = MockRunner::new();

        let err = publisher(&mock, &tmp).publish("nginx").unwrap_err();
        assert!(matches!(err, CiError::PackageMissing { .. }));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_login() {
        let tmp = fixture(false);
        let mock = MockRunner::new();
        let creds = RegistryCredentials {
            host: "registry.example.com".into(),
            username: "ci-bot".into(),
            password: "token".into(),
        };

        publisher(&mock, &tmp).login(&creds).unwrap();
        assert_eq!(
            mock.command_lines(),
            vec!["helm registry login registry.example.com -u ci-bot --password-stdin"]
        );

        mock.on("helm", &["registry", "login"], ToolOutput::failed(1, "denied"));
        let err = publisher(&mock, &tmp).login(&creds).unwrap_err();
        assert!(matches!(err, CiError::LoginFailed { .. }));
    }

    #[test]
    fn test_name_mismatch_not_published() {
        let tmp = fixture(true);
        std::fs::write(
            tmp.path().join("charts/nginx/Chart.yaml"),
            "name: web\nversion: 1.0.0\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join(".packages/web-1.0.0.tgz"), b"tgz").unwrap();
        let mock = MockRunner::new();

        let err = publisher(&mock, &tmp).publish("nginx").unwrap_err();
        assert!(matches!(
            err,
            CiError::Chart(chartpipe_core::CoreError::NameMismatch { ref directory, .. })
                if directory == "nginx"
        ));
        assert!(mock.calls().is_empty());
    }
}
