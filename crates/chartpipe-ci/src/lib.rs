//! chartpipe CI - the pipeline steps around `helm` and `git`
//!
//! Every external call goes through [`ToolRunner`], so the whole pipeline
//! can be exercised with [`MockRunner`] instead of real binaries.
//!
//! - [`ChangeDetector`]: charts touched by a git range
//! - [`Validator`]: lint, dependency update and render check
//! - [`Packager`]: `.helmignore` sync and `helm package`
//! - [`Publisher`]: create-once pushes to an OCI registry
//! - [`Pipeline`]: fail-fast sequencing over one or many charts
//! - [`Notification`] / [`Notifier`]: console banners and Discord webhooks

pub mod config;
pub mod detect;
pub mod error;
pub mod git;
pub mod helm;
pub mod notify;
pub mod package;
pub mod pipeline;
pub mod publish;
pub mod runner;
pub mod validate;

pub use config::{CiEnvironment, PipelineConfig, RegistryCredentials, RegistryTarget};
pub use detect::{ChangeDetector, Detection, DiffScope};
pub use error::{CiError, Result};
pub use git::GitClient;
pub use helm::HelmClient;
pub use notify::{Notification, NotificationKind, Notifier, deliver};
pub use package::{PackageReport, Packager};
pub use pipeline::{
    BatchReport, ChartFailure, ChartRun, Pipeline, PipelineObserver, Silent, Step, StepOutcome,
};
pub use publish::{PublishOutcome, Publisher};
pub use runner::{MockRunner, ProcessRunner, ToolOutput, ToolRunner};
pub use validate::{ValidationReport, ValidationSteps, Validator, count_documents};
