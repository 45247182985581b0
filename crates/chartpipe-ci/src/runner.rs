//! External tool execution
//!
//! Every `helm` and `git` call goes through [`ToolRunner`], so the pipeline
//! can be driven by [`MockRunner`] in tests.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{CiError, Result};

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable exit status
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs an external program to completion
pub trait ToolRunner {
    /// Run `program args...`, optionally feeding `stdin`
    ///
    /// A non-zero exit is NOT an error here; callers inspect the output.
    /// Errors mean the process could not be started at all.
    fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<ToolOutput>;
}

/// Runs real child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    cwd: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every command from `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(dir.into()),
        }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<ToolOutput> {
        tracing::debug!("Running: {} {}", program, args.join(" "));

        let mut command = Command::new(program);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let unavailable = |source| CiError::ToolUnavailable {
            tool: program.to_string(),
            source,
        };

        let mut child = command.spawn().map_err(unavailable)?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // The exit status and stderr still decide the result
                if let Err(e) = pipe.write_all(input.as_bytes()) {
                    tracing::debug!("{} closed stdin early: {}", program, e);
                }
                // Dropping the pipe closes it so the child sees EOF
            }
        }

        let output = child.wait_with_output()?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// A recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl Invocation {
    /// `program arg1 arg2 ...`
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub use mock::MockRunner;

pub mod mock {
    //! Scripted runner for tests

    use std::sync::{Arc, Mutex};

    use super::{Invocation, ToolOutput, ToolRunner};
    use crate::error::Result;

    struct Rule {
        program: String,
        args_prefix: Vec<String>,
        output: ToolOutput,
    }

    /// Answers invocations from a list of rules and records every call
    ///
    /// Rules match on program name and a prefix of the arguments; the last
    /// matching rule wins. Unmatched calls succeed with empty output.
    #[derive(Clone, Default)]
    pub struct MockRunner {
        rules: Arc<Mutex<Vec<Rule>>>,
        calls: Arc<Mutex<Vec<Invocation>>>,
    }

    impl MockRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `program args_prefix...` with `output`
        pub fn on(&self, program: &str, args_prefix: &[&str], output: ToolOutput) -> &Self {
            if let Ok(mut rules) = self.rules.lock() {
                rules.push(Rule {
                    program: program.to_string(),
                    args_prefix: args_prefix.iter().map(|s| s.to_string()).collect(),
                    output,
                });
            }
            self
        }

        /// All recorded invocations, in order
        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        /// Recorded invocations rendered as command lines
        pub fn command_lines(&self) -> Vec<String> {
            self.calls().iter().map(Invocation::command_line).collect()
        }

        /// Number of calls whose arguments start with `args_prefix`
        pub fn count(&self, program: &str, args_prefix: &[&str]) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.program == program && starts_with(&c.args, args_prefix))
                .count()
        }
    }

    fn starts_with<S: AsRef<str>>(args: &[String], prefix: &[S]) -> bool {
        args.len() >= prefix.len()
            && args
                .iter()
                .zip(prefix)
                .all(|(a, p)| a.as_str() == p.as_ref())
    }

    impl ToolRunner for MockRunner {
        fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<ToolOutput> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(Invocation {
                    program: program.to_string(),
                    args: args.to_vec(),
                    stdin: stdin.map(str::to_string),
                });
            }

            let mut output = None;
            if let Ok(rules) = self.rules.lock() {
                output = rules
                    .iter()
                    .rev()
                    .find(|r| r.program == program && starts_with(args, r.args_prefix.as_slice()))
                    .map(|r| r.output.clone());
            }

            Ok(output.unwrap_or_else(|| ToolOutput::ok("")))
        }
    }
}
