//! Notify command - announce validated or published charts

use std::path::Path;

use chartpipe_ci::{Notification, NotificationKind, Notifier, deliver};
use chartpipe_core::read_chart_list;

use super::Context;
use crate::error::Result;

pub fn run(
    ctx: &Context,
    kind: NotificationKind,
    input_file: &Path,
    registry: Option<&str>,
) -> Result<()> {
    let charts = if input_file.exists() {
        read_chart_list(input_file)?
    } else {
        tracing::warn!("Input file not found: {}", input_file.display());
        Vec::new()
    };

    let target = ctx.registry_target(registry)?;
    let notification = Notification::new(kind, charts, &ctx.env, target.repository());

    print!("{}", notification.banner());

    let notifier = match Notifier::from_env(&ctx.env) {
        Ok(notifier) => notifier,
        Err(e) => {
            tracing::warn!("Webhook disabled: {}", e);
            None
        }
    };
    deliver(notifier.as_ref(), &notification);

    Ok(())
}
