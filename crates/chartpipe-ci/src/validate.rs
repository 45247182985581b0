//! Chart validation: lint, dependency update, render check

use serde::Deserialize;

use chartpipe_core::{ChartsDir, LoadedChart};

use crate::error::{CiError, Result};
use crate::helm::{HelmClient, TEST_RELEASE};

/// Which validation steps to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSteps {
    pub lint: bool,
    pub dependencies: bool,
    pub render: bool,
}

impl ValidationSteps {
    /// `helm lint --strict` only
    pub fn lint() -> Self {
        Self {
            lint: true,
            dependencies: false,
            render: false,
        }
    }

    /// Dependency update and render check
    pub fn render() -> Self {
        Self {
            lint: false,
            dependencies: true,
            render: true,
        }
    }

    /// Everything
    pub fn full() -> Self {
        Self {
            lint: true,
            dependencies: true,
            render: true,
        }
    }
}

/// Result of validating one chart
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub chart: String,
    pub version: semver::Version,
    pub linted: bool,
    pub dependencies_updated: bool,
    /// Non-empty YAML documents in the rendered output, if rendered
    pub documents: Option<usize>,
}

/// Count the non-empty documents of a multi-document YAML stream
pub fn count_documents(rendered: &str) -> std::result::Result<usize, serde_yaml::Error> {
    let mut count = 0;
    for document in serde_yaml::Deserializer::from_str(rendered) {
        let value = serde_yaml::Value::deserialize(document)?;
        if !value.is_null() {
            count += 1;
        }
    }
    Ok(count)
}

pub struct Validator<'a> {
    helm: HelmClient<'a>,
    charts: ChartsDir,
}

impl<'a> Validator<'a> {
    pub fn new(helm: HelmClient<'a>, charts: ChartsDir) -> Self {
        Self { helm, charts }
    }

    /// Validate one chart, stopping at the first failing step
    pub fn validate(&self, name: &str, steps: ValidationSteps) -> Result<ValidationReport> {
        let chart = self.charts.load(name)?;
        chart.check_name()?;

        tracing::info!(
            "Validating {} {} (app {})",
            chart.metadata.name,
            chart.metadata.version,
            chart.metadata.app_version.as_deref().unwrap_or("-")
        );

        let mut report = ValidationReport {
            chart: chart.metadata.name.clone(),
            version: chart.metadata.version.clone(),
            linted: false,
            dependencies_updated: false,
            documents: None,
        };

        if steps.lint {
            let output = self.helm.lint(&chart.root, true)?;
            tracing::debug!("Lint output:\n{}", output.stdout);
            report.linted = true;
        }

        if steps.dependencies && chart.metadata.has_dependencies() {
            self.helm.dependency_update(&chart.root)?;
            report.dependencies_updated = true;
        }

        if steps.render {
            report.documents = Some(self.render(&chart)?);
        }

        Ok(report)
    }

    fn render(&self, chart: &LoadedChart) -> Result<usize> {
        let rendered = self.helm.template(TEST_RELEASE, &chart.root)?;
        count_documents(&rendered).map_err(|e| CiError::InvalidRender {
            chart: chart.metadata.name.clone(),
            message: e.to_string(),
        })
    }
}
