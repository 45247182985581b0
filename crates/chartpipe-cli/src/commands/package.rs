//! Package command - build chart archives with helm

use chartpipe_ci::Step;
use console::style;

use super::{ChartSelection, Context, run_batch};
use crate::error::Result;

pub fn run(ctx: &Context, selection: &ChartSelection) -> Result<()> {
    println!(
        "{} Packaging into {}",
        style("→").blue(),
        ctx.config.packages_dir.display()
    );

    run_batch(ctx, selection, Step::Package, None)
}
