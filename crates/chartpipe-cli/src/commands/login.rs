//! Login command - `helm registry login` with CI credentials

use chartpipe_ci::Pipeline;
use console::style;

use super::Context;
use crate::error::Result;

pub fn run(ctx: &Context, registry: Option<&str>) -> Result<()> {
    let target = ctx.registry_target(registry)?;
    let credentials = ctx.env.credentials(&target)?;

    Pipeline::new(&ctx.runner, &ctx.config)
        .with_target(target)
        .login(&credentials)?;

    println!(
        "{} Logged in to {} as {}",
        style("✓").green().bold(),
        credentials.host,
        credentials.username
    );

    Ok(())
}
