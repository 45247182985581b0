//! Push and release commands - idempotent publishing to an OCI registry

use chartpipe_ci::Step;

use super::{ChartSelection, Context, run_batch};
use crate::error::Result;

/// Push already-packaged charts, skipping versions the registry has
pub fn push(ctx: &Context, selection: &ChartSelection, registry: Option<&str>) -> Result<()> {
    let target = ctx.registry_target(registry)?;
    run_batch(ctx, selection, Step::Publish, Some(target))
}

/// Validate, package and push each chart in turn
pub fn release(ctx: &Context, selection: &ChartSelection, registry: Option<&str>) -> Result<()> {
    let target = ctx.registry_target(registry)?;
    run_batch(ctx, selection, Step::Release, Some(target))
}
