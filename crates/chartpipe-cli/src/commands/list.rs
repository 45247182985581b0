//! List command - show every chart with its versions

use console::style;
use serde::Serialize;

use super::Context;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartEntry {
    name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let charts = ctx.charts();
    let mut entries = Vec::new();

    for name in charts.all()? {
        match charts.load(&name) {
            Ok(chart) => entries.push(ChartEntry {
                name,
                version: chart.metadata.version.to_string(),
                app_version: chart.metadata.app_version,
                description: chart.metadata.description,
            }),
            Err(e) => tracing::warn!("Skipping {}: {}", name, e),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!(
            "No charts found in {}",
            ctx.config.charts_dir.display()
        );
        return Ok(());
    }

    println!(
        "{:<30} {:<12} {:<12}",
        style("NAME").bold(),
        style("VERSION").bold(),
        style("APP VERSION").bold()
    );

    for entry in &entries {
        println!(
            "{:<30} {:<12} {:<12}",
            entry.name,
            entry.version,
            entry.app_version.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
