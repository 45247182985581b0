//! CLI commands

use std::path::PathBuf;

use chartpipe_ci::{CiEnvironment, Pipeline, PipelineConfig, ProcessRunner, RegistryTarget, Step};
use chartpipe_core::{ChartsDir, read_chart_list};
use console::style;

use crate::display::{ConsoleObserver, print_summary};
use crate::error::{CliError, Result};

pub mod bump;
pub mod detect;
pub mod lint;
pub mod list;
pub mod login;
pub mod notify;
pub mod package;
pub mod publish;

/// Which charts a command operates on
#[derive(Debug, Clone)]
pub enum ChartSelection {
    One(String),
    All,
    InputFile(PathBuf),
}

/// Shared state for every command
pub struct Context {
    pub config: PipelineConfig,
    pub env: CiEnvironment,
    pub runner: ProcessRunner,
}

impl Context {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            env: CiEnvironment::from_env(),
            runner: ProcessRunner::new(),
        }
    }

    pub fn charts(&self) -> ChartsDir {
        ChartsDir::new(&self.config.charts_dir)
    }

    /// Turn a selection into an ordered list of chart names
    pub fn resolve(&self, selection: &ChartSelection) -> Result<Vec<String>> {
        match selection {
            ChartSelection::One(name) => Ok(vec![name.clone()]),
            ChartSelection::All => Ok(self.charts().all()?),
            ChartSelection::InputFile(path) => {
                let charts = read_chart_list(path).map_err(|e| CliError::Io {
                    message: format!("{}: {}", path.display(), e),
                })?;
                if charts.is_empty() {
                    tracing::info!("{} lists no charts", path.display());
                }
                Ok(charts)
            }
        }
    }

    /// Registry target from `--registry` or the CI environment
    pub fn registry_target(&self, explicit: Option<&str>) -> Result<RegistryTarget> {
        Ok(self.env.registry_target(explicit)?)
    }
}

/// Run `step` over the selection, print the summary, fail on the first error
pub fn run_batch(
    ctx: &Context,
    selection: &ChartSelection,
    step: Step,
    target: Option<RegistryTarget>,
) -> Result<()> {
    let charts = ctx.resolve(selection)?;

    let observer = ConsoleObserver;
    let mut pipeline = Pipeline::new(&ctx.runner, &ctx.config).with_observer(&observer);

    if let Some(target) = target {
        println!("{} Registry: {}", style("→").blue(), target);
        let credentials = ctx.env.optional_credentials(&target);
        pipeline = pipeline.with_target(target);

        match credentials {
            Some(credentials) if !charts.is_empty() => {
                pipeline.login(&credentials)?;
                println!("  {} Logged in to {}", style("✓").green(), credentials.host);
            }
            Some(_) => {}
            None => tracing::debug!("No registry credentials set, relying on existing helm login"),
        }
    }

    let report = pipeline.run_batch(&charts, step);
    print_summary(&report);
    report.into_result()?;
    Ok(())
}
