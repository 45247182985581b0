//! CLI error types with exit code handling
//!
//! Library errors are folded into [`CliError`] so every failure maps to one
//! of the documented exit codes and carries a help line where one exists.

use chartpipe_ci::CiError;
use chartpipe_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Lint, render or Chart.yaml checks failed
    #[error("Validation failed: {message}")]
    #[diagnostic(code(chartpipe::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Unknown chart or missing Chart.yaml
    #[error("{message}")]
    #[diagnostic(code(chartpipe::cli::chart_not_found))]
    ChartNotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Packaging failed
    #[error("Package error: {message}")]
    #[diagnostic(code(chartpipe::cli::package))]
    Package {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Registry push or login failed
    #[error("Publish error: {message}")]
    #[diagnostic(code(chartpipe::cli::publish))]
    Publish {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Missing or invalid configuration (credentials, registry)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(chartpipe::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid arguments
    #[error("{message}")]
    #[diagnostic(code(chartpipe::cli::usage))]
    Usage { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(chartpipe::cli::io))]
    Io { message: String },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(chartpipe::cli::error))]
    Other {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::ChartNotFound { .. } => exit_codes::CHART_NOT_FOUND,
            CliError::Package { .. } | CliError::Publish { .. } => exit_codes::PACKAGE_ERROR,
            CliError::Config { .. } | CliError::Other { .. } => exit_codes::ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

fn push_hints(stderr: Option<&str>) -> String {
    let mut help = String::new();
    if let Some(stderr) = stderr {
        help.push_str(stderr);
        help.push_str("\n\n");
    }
    help.push_str(
        "Troubleshooting:\n  \
         1. Check registry credentials (CI_REGISTRY_USER / CI_REGISTRY_PASSWORD)\n  \
         2. Check the registry URL is correct\n  \
         3. Check network connectivity to the registry",
    );
    help
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ChartNotFound { .. } | CoreError::ChartYamlMissing { .. } => {
                CliError::ChartNotFound {
                    message,
                    help: Some("Run `chartpipe list` to see available charts".to_string()),
                }
            }
            CoreError::NameMismatch { directory, .. } => CliError::Validation {
                message,
                help: Some(format!("Set `name: {}` in Chart.yaml", directory)),
            },
            CoreError::UnknownBump(_) => CliError::usage(message),
            CoreError::Io(_) => CliError::Io { message },
            CoreError::InvalidChart { .. }
            | CoreError::YamlParse(_)
            | CoreError::InvalidVersion(_)
            | CoreError::VersionFieldMissing { .. } => CliError::Validation {
                message,
                help: None,
            },
        }
    }
}

impl From<CiError> for CliError {
    fn from(err: CiError) -> Self {
        let message = err.to_string();
        let stderr = err.tool_stderr().map(str::to_string);

        match err {
            CiError::Chart(core) => core.into(),
            CiError::InvalidRender { .. } => CliError::Validation {
                message,
                help: None,
            },
            CiError::ToolFailed { ref command, .. } => {
                if command.ends_with("package") || command.ends_with("dependency build") {
                    CliError::Package {
                        message,
                        help: stderr,
                    }
                } else if command.ends_with("lint")
                    || command.ends_with("template")
                    || command.ends_with("dependency update")
                {
                    CliError::Validation {
                        message,
                        help: stderr,
                    }
                } else {
                    CliError::Other {
                        message,
                        help: stderr,
                    }
                }
            }
            CiError::ToolUnavailable { ref tool, .. } => CliError::Other {
                help: Some(format!(
                    "Make sure '{}' is installed and on PATH, or pass its location with --helm / --git",
                    tool
                )),
                message,
            },
            CiError::PackageMissing { .. } => CliError::Package {
                message,
                help: Some("Run `chartpipe package` first".to_string()),
            },
            CiError::PushFailed { .. } => CliError::Publish {
                message,
                help: Some(push_hints(stderr.as_deref())),
            },
            CiError::LoginFailed { .. } => CliError::Publish {
                message,
                help: stderr,
            },
            CiError::MissingCredential { .. } => CliError::Config {
                message,
                help: Some(
                    "Set CI_REGISTRY_USER and CI_REGISTRY_PASSWORD in the CI environment"
                        .to_string(),
                ),
            },
            CiError::InvalidRegistry { .. } | CiError::NoRegistry => CliError::Config {
                message,
                help: Some(
                    "Pass --registry oci://host/path or set CI_REGISTRY_IMAGE".to_string(),
                ),
            },
            CiError::Webhook { .. } => CliError::other(message),
            CiError::Io(_) => CliError::Io { message },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::other(format!("JSON error: {}", err))
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_errors_map_to_exit_codes() {
        let err: CliError = CiError::Chart(CoreError::ChartNotFound {
            path: "charts/ghost".into(),
        })
        .into();
        assert_eq!(err.exit_code(), exit_codes::CHART_NOT_FOUND);

        let err: CliError = CoreError::NameMismatch {
            directory: "nginx".into(),
            declared: "web".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);

        let err: CliError = CoreError::UnknownBump("huge".into()).into();
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
    }

    #[test]
    fn test_tool_failures_by_command() {
        let failed = |command: &str| CiError::ToolFailed {
            command: command.into(),
            status: "exit code 1".into(),
            stdout: String::new(),
            stderr: "boom".into(),
        };

        assert_eq!(CliError::from(failed("helm lint")).exit_code(), 2);
        assert_eq!(CliError::from(failed("helm dependency update")).exit_code(), 2);
        assert_eq!(CliError::from(failed("helm package")).exit_code(), 4);
        assert_eq!(CliError::from(failed("helm dependency build")).exit_code(), 4);
        assert_eq!(CliError::from(failed("git diff")).exit_code(), 1);
    }

    #[test]
    fn test_push_failure_help() {
        let err = CliError::from(CiError::PushFailed {
            reference: "ghcr.io/acme/nginx:1.0.0".into(),
            stderr: "denied: permission_denied\n".into(),
        });
        assert_eq!(err.exit_code(), exit_codes::PACKAGE_ERROR);

        let CliError::Publish { help: Some(help), .. } = err else {
            panic!("expected publish error with help");
        };
        assert!(help.starts_with("denied: permission_denied\n\nTroubleshooting"));
    }

    #[test]
    fn test_config_errors() {
        let err = CliError::from(CiError::MissingCredential {
            variable: "CI_REGISTRY_USER".into(),
        });
        assert_eq!(err.exit_code(), exit_codes::ERROR);
        assert!(err.to_string().contains("CI_REGISTRY_USER"));
    }
}
