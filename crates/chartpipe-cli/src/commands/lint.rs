//! Lint, test and validate commands

use chartpipe_ci::Step;
use console::style;

use super::{ChartSelection, Context, run_batch};
use crate::error::Result;

/// Run a validation step (`lint`, `test` or `validate`) over the selection
pub fn run(ctx: &Context, selection: &ChartSelection, step: Step) -> Result<()> {
    println!(
        "{} Running {} in {}",
        style("→").blue(),
        step,
        ctx.config.charts_dir.display()
    );

    run_batch(ctx, selection, step, None)
}
