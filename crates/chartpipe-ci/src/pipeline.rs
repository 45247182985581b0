//! Per-chart step sequencing and fail-fast batches
//!
//! A [`Pipeline`] runs one [`Step`] over one chart or a list of charts.
//! Batches stop at the first failing chart; charts finished before it keep
//! whatever they produced (archives stay on disk, tags stay published).

use std::fmt;
use std::time::{Duration, Instant};

use chartpipe_core::ChartsDir;

use crate::config::{PipelineConfig, RegistryCredentials, RegistryTarget};
use crate::error::{CiError, Result};
use crate::helm::HelmClient;
use crate::package::{PackageReport, Packager};
use crate::publish::{PublishOutcome, Publisher};
use crate::runner::ToolRunner;
use crate::validate::{ValidationReport, ValidationSteps, Validator};

/// What to do with each chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// `helm lint --strict`
    Lint,
    /// Dependency update and render check
    Test,
    /// Lint and render check
    Validate,
    Package,
    Publish,
    /// Validate, package, publish
    Release,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::Lint => "lint",
            Step::Test => "test",
            Step::Validate => "validate",
            Step::Package => "package",
            Step::Publish => "publish",
            Step::Release => "release",
        }
    }

    /// Whether this step talks to the registry
    pub fn needs_registry(&self) -> bool {
        matches!(self, Step::Publish | Step::Release)
    }

    fn validation(&self) -> Option<ValidationSteps> {
        match self {
            Step::Lint => Some(ValidationSteps::lint()),
            Step::Test => Some(ValidationSteps::render()),
            Step::Validate | Step::Release => Some(ValidationSteps::full()),
            Step::Package | Step::Publish => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one finished step
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Validated(ValidationReport),
    Packaged(PackageReport),
    Published(PublishOutcome),
}

/// Everything that happened to one chart
#[derive(Debug, Clone)]
pub struct ChartRun {
    pub chart: String,
    pub outcomes: Vec<StepOutcome>,
    pub duration: Duration,
}

impl ChartRun {
    /// The publish outcome, if the chart reached that step
    pub fn published(&self) -> Option<&PublishOutcome> {
        self.outcomes.iter().find_map(|o| match o {
            StepOutcome::Published(p) => Some(p),
            _ => None,
        })
    }
}

/// The chart that stopped a batch
#[derive(Debug)]
pub struct ChartFailure {
    pub chart: String,
    pub error: CiError,
}

/// Summary of a batch run
#[derive(Debug)]
pub struct BatchReport {
    pub step: Step,
    pub completed: Vec<ChartRun>,
    pub failure: Option<ChartFailure>,
    /// Charts never attempted because an earlier one failed
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.skipped.len() + usize::from(self.failure.is_some())
    }

    /// Charts whose tag was newly pushed
    pub fn pushed(&self) -> Vec<&str> {
        self.completed
            .iter()
            .filter(|run| run.published().is_some_and(PublishOutcome::was_pushed))
            .map(|run| run.chart.as_str())
            .collect()
    }

    /// The first failure as an error, dropping the report
    pub fn into_result(self) -> Result<Vec<ChartRun>> {
        match self.failure {
            Some(failure) => Err(failure.error),
            None => Ok(self.completed),
        }
    }
}

/// Progress callbacks for batch runs
pub trait PipelineObserver {
    fn chart_started(&self, _chart: &str, _index: usize, _total: usize) {}

    fn step_finished(&self, _chart: &str, _outcome: &StepOutcome) {}

    fn chart_failed(&self, _chart: &str, _error: &CiError) {}
}

/// Observer that ignores everything
pub struct Silent;

impl PipelineObserver for Silent {}

pub struct Pipeline<'a> {
    runner: &'a dyn ToolRunner,
    config: &'a PipelineConfig,
    target: Option<RegistryTarget>,
    observer: &'a dyn PipelineObserver,
}

impl<'a> Pipeline<'a> {
    pub fn new(runner: &'a dyn ToolRunner, config: &'a PipelineConfig) -> Self {
        Self {
            runner,
            config,
            target: None,
            observer: &Silent,
        }
    }

    pub fn with_target(mut self, target: RegistryTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn PipelineObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn charts(&self) -> ChartsDir {
        ChartsDir::new(&self.config.charts_dir)
    }

    fn helm(&self) -> HelmClient<'a> {
        HelmClient::new(self.runner, self.config.helm_bin.clone())
    }

    fn validator(&self) -> Validator<'a> {
        Validator::new(self.helm(), self.charts())
    }

    fn packager(&self) -> Packager<'a> {
        Packager::new(self.helm(), self.charts(), &self.config.packages_dir)
    }

    fn publisher(&self) -> Result<Publisher<'a>> {
        let target = self.target.clone().ok_or(CiError::NoRegistry)?;
        Ok(Publisher::new(
            self.helm(),
            self.charts(),
            &self.config.packages_dir,
            target,
        ))
    }

    /// Log in to the configured registry
    pub fn login(&self, credentials: &RegistryCredentials) -> Result<()> {
        self.publisher()?.login(credentials)
    }

    /// Run `step` over one chart, stopping at its first failing sub-step
    pub fn run_chart(&self, name: &str, step: Step) -> Result<ChartRun> {
        let started = Instant::now();
        let mut outcomes = Vec::new();
        let mut record = |outcome: StepOutcome| {
            self.observer.step_finished(name, &outcome);
            outcomes.push(outcome);
        };

        if let Some(steps) = step.validation() {
            record(StepOutcome::Validated(self.validator().validate(name, steps)?));
        }

        if matches!(step, Step::Package | Step::Release) {
            record(StepOutcome::Packaged(self.packager().package(name)?));
        }

        if step.needs_registry() {
            record(StepOutcome::Published(self.publisher()?.publish(name)?));
        }

        Ok(ChartRun {
            chart: name.to_string(),
            outcomes,
            duration: started.elapsed(),
        })
    }

    /// Run `step` over `charts` in order, stopping at the first failure
    pub fn run_batch(&self, charts: &[String], step: Step) -> BatchReport {
        let mut report = BatchReport {
            step,
            completed: Vec::new(),
            failure: None,
            skipped: Vec::new(),
        };

        if charts.is_empty() {
            tracing::info!("No charts to {}", step);
            return report;
        }

        let total = charts.len();
        for (index, chart) in charts.iter().enumerate() {
            self.observer.chart_started(chart, index + 1, total);

            match self.run_chart(chart, step) {
                Ok(run) => report.completed.push(run),
                Err(error) => {
                    tracing::error!("{} failed for {}: {}", step, chart, error);
                    self.observer.chart_failed(chart, &error);
                    report.failure = Some(ChartFailure {
                        chart: chart.clone(),
                        error,
                    });
                    report.skipped = charts[index + 1..].to_vec();
                    break;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{MockRunner, ToolOutput};
    use std::cell::RefCell;
    use tempfile::TempDir;

    const REGISTRY: &str = "oci://registry.example.com/homelab/helm-charts";

    struct Workspace {
        _tmp: TempDir,
        config: PipelineConfig,
    }

    /// Charts with pre-built archives, since the mocked helm writes nothing
    fn workspace(charts: &[(&str, &str)]) -> Workspace {
        let tmp = TempDir::new().unwrap();
        let config = PipelineConfig {
            charts_dir: tmp.path().join("charts"),
            packages_dir: tmp.path().join(".packages"),
            ..Default::default()
        };
        std::fs::create_dir_all(&config.packages_dir).unwrap();
        for (name, version) in charts {
            let dir = config.charts_dir.join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(
                dir.join("Chart.yaml"),
                format!("name: {}\nversion: {}\n", name, version),
            )
            .unwrap();
            std::fs::write(
                config.packages_dir.join(format!("{}-{}.tgz", name, version)),
                b"tgz",
            )
            .unwrap();
        }
        Workspace { _tmp: tmp, config }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl PipelineObserver for Recorder {
        fn chart_started(&self, chart: &str, index: usize, total: usize) {
            self.events
                .borrow_mut()
                .push(format!("start {} {}/{}", chart, index, total));
        }

        fn step_finished(&self, chart: &str, outcome: &StepOutcome) {
            let kind = match outcome {
                StepOutcome::Validated(_) => "validated",
                StepOutcome::Packaged(_) => "packaged",
                StepOutcome::Published(_) => "published",
            };
            self.events.borrow_mut().push(format!("{} {}", kind, chart));
        }

        fn chart_failed(&self, chart: &str, _error: &CiError) {
            self.events.borrow_mut().push(format!("failed {}", chart));
        }
    }

    #[test]
    fn test_release_sequence() {
        let ws = workspace(&[("nginx", "1.0.0")]);
        let mock = MockRunner::new();
        mock.on("helm", &["show", "chart"], ToolOutput::failed(1, "not found"));

        let pipeline = Pipeline::new(&mock, &ws.config)
            .with_target(RegistryTarget::parse(REGISTRY).unwrap());
        let run = pipeline.run_chart("nginx", Step::Release).unwrap();

        assert_eq!(run.outcomes.len(), 3);
        assert!(run.published().unwrap().was_pushed());

        let programs: Vec<String> = mock
            .calls()
            .iter()
            .map(|c| c.args[0].clone())
            .collect();
        assert_eq!(programs, vec!["lint", "template", "package", "show", "push"]);
    }

    #[test]
    fn test_release_rerun_is_noop() {
        let ws = workspace(&[("nginx", "1.0.0")]);
        let mock = MockRunner::new();
        mock.on("helm", &["show", "chart"], ToolOutput::ok("name: nginx"));

        let pipeline = Pipeline::new(&mock, &ws.config)
            .with_target(RegistryTarget::parse(REGISTRY).unwrap());
        let report = pipeline.run_batch(&names(&["nginx"]), Step::Release);

        assert!(report.is_success());
        assert!(report.pushed().is_empty());
        assert_eq!(mock.count("helm", &["push"]), 0);
    }

    #[test]
    fn test_batch_stops_at_first_failure() {
        let ws = workspace(&[("a", "0.1.0"), ("b", "0.1.0"), ("c", "0.1.0")]);
        let b_dir = ws.config.charts_dir.join("b").display().to_string();
        let mock = MockRunner::new();
        mock.on("helm", &["lint", "--strict", b_dir.as_str()], ToolOutput::failed(1, "bad"));
        let recorder = Recorder::default();

        let pipeline = Pipeline::new(&mock, &ws.config).with_observer(&recorder);
        let report = pipeline.run_batch(&names(&["a", "b", "c"]), Step::Lint);

        assert!(!report.is_success());
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.failure.as_ref().unwrap().chart, "b");
        assert_eq!(report.skipped, vec!["c"]);
        assert_eq!(report.total(), 3);
        assert_eq!(mock.count("helm", &["lint"]), 2);
        assert_eq!(
            *recorder.events.borrow(),
            vec![
                "start a 1/3",
                "validated a",
                "start b 2/3",
                "failed b",
            ]
        );

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, CiError::ToolFailed { .. }));
    }

    #[test]
    fn test_empty_batch_is_success() {
        let ws = workspace(&[]);
        let mock = MockRunner::new();

        let report = Pipeline::new(&mock, &ws.config).run_batch(&[], Step::Release);
        assert!(report.is_success());
        assert_eq!(report.total(), 0);
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_publish_without_target() {
        let ws = workspace(&[("nginx", "1.0.0")]);
        let mock = MockRunner::new();

        let err = Pipeline::new(&mock, &ws.config)
            .run_chart("nginx", Step::Publish)
            .unwrap_err();
        assert!(matches!(err, CiError::NoRegistry));
    }

    #[test]
    fn test_unknown_chart() {
        let ws = workspace(&[("nginx", "1.0.0")]);
        let mock = MockRunner::new();

        let report = Pipeline::new(&mock, &ws.config).run_batch(&names(&["ghost"]), Step::Validate);
        let failure = report.failure.unwrap();
        assert!(matches!(
            failure.error,
            CiError::Chart(chartpipe_core::CoreError::ChartNotFound { .. })
        ));
    }
}
