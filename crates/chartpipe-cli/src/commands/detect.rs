//! Detect command - list charts changed in the current git range

use std::path::Path;

use chartpipe_ci::{ChangeDetector, GitClient};
use clap::ValueEnum;

use super::Context;
use crate::error::Result;

/// How detected charts are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One chart per line
    Text,
    /// `{"charts": [...]}`
    Json,
}

pub fn run(
    ctx: &Context,
    base: Option<&str>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let git = GitClient::new(&ctx.runner, ctx.config.git_bin.clone());
    let mut detector = ChangeDetector::new(git, ctx.charts(), &ctx.env);
    if let Some(base) = base {
        detector = detector.with_base(base);
    }

    let detection = detector.detect()?;
    tracing::info!("Compared {}", detection.scope);

    let rendered = match format {
        OutputFormat::Text => detection.to_text(),
        OutputFormat::Json => format!("{}\n", detection.to_json()?),
    };

    print!("{}", rendered);

    if let Some(path) = output {
        std::fs::write(path, &rendered)?;
        tracing::info!("Wrote {} chart(s) to {}", detection.charts.len(), path.display());
    }

    Ok(())
}
