//! Bump command - increment a chart's version in place

use chartpipe_core::{BumpKind, bump_chart};
use clap::ValueEnum;
use console::style;

use super::Context;
use crate::error::Result;

/// Which version component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BumpArg {
    /// x.y.Z
    Patch,
    /// x.Y.0
    Minor,
    /// X.0.0
    Major,
}

impl From<BumpArg> for BumpKind {
    fn from(arg: BumpArg) -> Self {
        match arg {
            BumpArg::Patch => BumpKind::Patch,
            BumpArg::Minor => BumpKind::Minor,
            BumpArg::Major => BumpKind::Major,
        }
    }
}

pub fn run(ctx: &Context, chart: &str, kind: BumpArg) -> Result<()> {
    let kind = BumpKind::from(kind);
    let path = ctx.charts().chart_path(chart)?;

    let result = bump_chart(&path, kind)?;

    println!(
        "{} {}: {} → {} ({})",
        style("✓").green().bold(),
        result.chart,
        result.previous,
        style(&result.current).bold(),
        kind
    );

    Ok(())
}
