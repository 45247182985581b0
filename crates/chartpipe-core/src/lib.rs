//! chartpipe core - chart model and repository layout
//!
//! This crate has no knowledge of `helm` or `git`; it provides:
//! - `ChartMetadata` / `LoadedChart`: parsed `Chart.yaml`
//! - `ChartsDir`: discovery of charts and mapping of changed paths to charts
//! - `BumpKind` / `bump_chart`: SemVer bumps written back in place
//! - `sync_helmignore`: `.gitignore` → `.helmignore` pattern merge

pub mod chart;
pub mod error;
pub mod helmignore;
pub mod repo;
pub mod version;

pub use chart::{ChartDependency, ChartKind, ChartMetadata, LoadedChart, Maintainer};
pub use error::{CoreError, Result};
pub use helmignore::{SyncOutcome, sync_helmignore};
pub use repo::{ChartsDir, parse_chart_list, read_chart_list};
pub use version::{BumpKind, BumpResult, bump_chart, bump_version};
