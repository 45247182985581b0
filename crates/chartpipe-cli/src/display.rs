//! Display formatting for CLI output
//!
//! Progress lines for pipeline runs and the end-of-batch summary table.

use chartpipe_ci::{
    BatchReport, CiError, PipelineObserver, PublishOutcome, StepOutcome, ValidationReport,
};
use console::style;

use crate::util::{format_duration, format_size};

/// Prints progress of a batch to stdout
pub struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn chart_started(&self, chart: &str, index: usize, total: usize) {
        println!();
        println!(
            "{} {} {}",
            style("→").blue(),
            style(format!("[{}/{}]", index, total)).dim(),
            style(chart).cyan().bold()
        );
    }

    fn step_finished(&self, _chart: &str, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Validated(report) => print_validation(report),
            StepOutcome::Packaged(report) => {
                println!(
                    "  {} Packaged {} ({})",
                    style("✓").green(),
                    report.path.display(),
                    format_size(report.size)
                );
            }
            StepOutcome::Published(PublishOutcome::Published { reference }) => {
                println!("  {} Published {}", style("✓").green(), reference);
            }
            StepOutcome::Published(PublishOutcome::AlreadyPublished { reference }) => {
                println!(
                    "  {} {} already exists, skipped",
                    style("⚠").yellow(),
                    reference
                );
            }
        }
    }

    fn chart_failed(&self, _chart: &str, error: &CiError) {
        println!("  {} {}", style("✗").red(), error);
        if let Some(stderr) = error.tool_stderr() {
            for line in stderr.lines() {
                println!("    {}", style(line).dim());
            }
        }
    }
}

fn print_validation(report: &ValidationReport) {
    println!(
        "  {} Chart.yaml is valid ({} v{})",
        style("✓").green(),
        report.chart,
        report.version
    );
    if report.linted {
        println!("  {} helm lint --strict passed", style("✓").green());
    }
    if report.dependencies_updated {
        println!("  {} Dependencies updated", style("✓").green());
    }
    if let Some(documents) = report.documents {
        println!(
            "  {} Rendered {} valid YAML document(s)",
            style("✓").green(),
            documents
        );
    }
}

/// Summary table after a batch
pub fn print_summary(report: &BatchReport) {
    if report.total() == 0 {
        println!("{} No charts to {}", style("ℹ").blue(), report.step);
        return;
    }

    println!();
    println!("{}", style("Summary").bold());

    for run in &report.completed {
        let note = match run.published() {
            Some(PublishOutcome::AlreadyPublished { .. }) => " (already published)",
            _ => "",
        };
        println!(
            "  {} {:<30} {}{}",
            style("✓").green(),
            run.chart,
            style(format_duration(run.duration)).dim(),
            note
        );
    }

    if let Some(failure) = &report.failure {
        println!("  {} {:<30} failed", style("✗").red(), failure.chart);
    }

    for chart in &report.skipped {
        println!("  {} {:<30} skipped", style("-").dim(), chart);
    }

    println!();
    if report.is_success() {
        println!(
            "{} {} {} chart(s)",
            style("✓").green().bold(),
            capitalize(report.step.label()),
            report.completed.len()
        );
    } else {
        println!(
            "{} {} stopped: {} succeeded, 1 failed, {} skipped",
            style("✗").red().bold(),
            capitalize(report.step.label()),
            report.completed.len(),
            report.skipped.len()
        );
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
