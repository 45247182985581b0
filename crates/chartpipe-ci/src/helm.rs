//! Thin client over the `helm` binary

use std::path::Path;

use crate::error::{CiError, Result};
use crate::runner::{ToolOutput, ToolRunner};

/// Release name used when rendering templates for validation
pub const TEST_RELEASE: &str = "test-release";

/// Client to run the helm subcommands the pipeline needs
pub struct HelmClient<'a> {
    runner: &'a dyn ToolRunner,
    bin: String,
}

impl<'a> HelmClient<'a> {
    pub fn new(runner: &'a dyn ToolRunner, bin: impl Into<String>) -> Self {
        Self {
            runner,
            bin: bin.into(),
        }
    }

    fn run(&self, args: Vec<String>, stdin: Option<&str>) -> Result<ToolOutput> {
        self.runner.run(&self.bin, &args, stdin)
    }

    /// Run and turn a non-zero exit into [`CiError::ToolFailed`]
    fn run_checked(&self, args: Vec<String>) -> Result<ToolOutput> {
        let words = match args.first().map(String::as_str) {
            Some("dependency" | "registry") => 2,
            _ => 1,
        };
        let command = std::iter::once(self.bin.as_str())
            .chain(args.iter().take(words).map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        let output = self.run(args, None)?;
        if output.success() {
            Ok(output)
        } else {
            Err(CiError::ToolFailed {
                command,
                status: output.status(),
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }

    /// `helm lint [--strict] <chart>`
    pub fn lint(&self, chart: &Path, strict: bool) -> Result<ToolOutput> {
        let mut args = vec!["lint".to_string()];
        if strict {
            args.push("--strict".to_string());
        }
        args.push(path_arg(chart));
        self.run_checked(args)
    }

    /// `helm dependency update <chart>`
    pub fn dependency_update(&self, chart: &Path) -> Result<ToolOutput> {
        self.run_checked(vec![
            "dependency".to_string(),
            "update".to_string(),
            path_arg(chart),
        ])
    }

    /// `helm dependency build <chart>`
    pub fn dependency_build(&self, chart: &Path) -> Result<ToolOutput> {
        self.run_checked(vec![
            "dependency".to_string(),
            "build".to_string(),
            path_arg(chart),
        ])
    }

    /// `helm template <release> <chart>`, returning the rendered manifests
    pub fn template(&self, release: &str, chart: &Path) -> Result<String> {
        let output = self.run_checked(vec![
            "template".to_string(),
            release.to_string(),
            path_arg(chart),
        ])?;
        Ok(output.stdout)
    }

    /// `helm package <chart> -d <destination>`
    pub fn package(&self, chart: &Path, destination: &Path) -> Result<ToolOutput> {
        self.run_checked(vec![
            "package".to_string(),
            path_arg(chart),
            "-d".to_string(),
            path_arg(destination),
        ])
    }

    /// Whether `<repository>/<name>` exists at `version` in an OCI registry
    ///
    /// Uses `helm show chart`; any failure (including network) reads as absent.
    pub fn chart_exists(&self, repository: &str, name: &str, version: &str) -> Result<bool> {
        let output = self.run(
            vec![
                "show".to_string(),
                "chart".to_string(),
                format!("{}/{}", repository, name),
                "--version".to_string(),
                version.to_string(),
            ],
            None,
        )?;
        if !output.success() {
            tracing::debug!("helm show chart: {}", output.stderr.trim());
        }
        Ok(output.success())
    }

    /// `helm push <package> <repository>`
    pub fn push(&self, package: &Path, repository: &str) -> Result<ToolOutput> {
        self.run(
            vec!["push".to_string(), path_arg(package), repository.to_string()],
            None,
        )
    }

    /// `helm registry login <host> -u <user> --password-stdin`
    pub fn registry_login(&self, host: &str, username: &str, password: &str) -> Result<ToolOutput> {
        self.run(
            vec![
                "registry".to_string(),
                "login".to_string(),
                host.to_string(),
                "-u".to_string(),
                username.to_string(),
                "--password-stdin".to_string(),
            ],
            Some(password),
        )
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MockRunner;

    #[test]
    fn test_lint_strict_args() {
        let mock = MockRunner::new();
        let helm = HelmClient::new(&mock, "helm");
        helm.lint(Path::new("charts/nginx"), true).unwrap();
        assert_eq!(mock.command_lines(), vec!["helm lint --strict charts/nginx"]);
    }

    #[test]
    fn test_failed_command_is_error() {
        let mock = MockRunner::new();
        mock.on("helm", &["lint"], ToolOutput::failed(1, "[ERROR] Chart.yaml: version is required"));
        let helm = HelmClient::new(&mock, "helm");

        let err = helm.lint(Path::new("charts/nginx"), false).unwrap_err();
        assert_eq!(err.to_string(), "helm lint failed (exit code 1)");
        assert_eq!(err.tool_stderr(), Some("[ERROR] Chart.yaml: version is required"));
    }

    #[test]
    fn test_chart_exists() {
        let mock = MockRunner::new();
        mock.on("helm", &["show", "chart"], ToolOutput::failed(1, "not found"));
        mock.on(
            "helm",
            &["show", "chart", "oci://r.example.com/charts/nginx"],
            ToolOutput::ok("name: nginx"),
        );
        let helm = HelmClient::new(&mock, "helm");

        assert!(helm.chart_exists("oci://r.example.com/charts", "nginx", "1.0.0").unwrap());
        assert!(!helm.chart_exists("oci://r.example.com/charts", "redis", "1.0.0").unwrap());
        assert_eq!(
            mock.command_lines()[0],
            "helm show chart oci://r.example.com/charts/nginx --version 1.0.0"
        );
    }

    #[test]
    fn test_login_uses_stdin() {
        let mock = MockRunner::new();
        let helm = HelmClient::new(&mock, "/usr/local/bin/helm");
        helm.registry_login("registry.example.com", "ci", "s3cret").unwrap();

        let calls = mock.calls();
        let call = &calls[0];
        assert_eq!(call.program, "/usr/local/bin/helm");
        assert!(!call.args.contains(&"s3cret".to_string()));
        assert_eq!(call.stdin.as_deref(), Some("s3cret"));
    }
}
