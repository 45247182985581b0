//! Thin client over the `git` binary

use crate::error::{CiError, Result};
use crate::runner::ToolRunner;

pub struct GitClient<'a> {
    runner: &'a dyn ToolRunner,
    bin: String,
}

impl<'a> GitClient<'a> {
    pub fn new(runner: &'a dyn ToolRunner, bin: impl Into<String>) -> Self {
        Self {
            runner,
            bin: bin.into(),
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Paths changed in `range` (`git diff --name-only <range>`)
    pub fn changed_files(&self, range: &str) -> Result<Vec<String>> {
        let output = self
            .runner
            .run(&self.bin, &Self::args(&["diff", "--name-only", range]), None)?;

        if !output.success() {
            return Err(CiError::ToolFailed {
                command: format!("{} diff", self.bin),
                status: output.status(),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Whether `rev` resolves to an object
    pub fn rev_exists(&self, rev: &str) -> Result<bool> {
        let output = self
            .runner
            .run(&self.bin, &Self::args(&["rev-parse", "--verify", "--quiet", rev]), None)?;
        Ok(output.success())
    }

    /// Shallow-fetch `branch` from `remote`
    pub fn fetch(&self, remote: &str, branch: &str, depth: u32) -> Result<()> {
        let depth = format!("--depth={}", depth);
        let output = self
            .runner
            .run(&self.bin, &Self::args(&["fetch", remote, branch, &depth]), None)?;

        if output.success() {
            Ok(())
        } else {
            Err(CiError::ToolFailed {
                command: format!("{} fetch", self.bin),
                status: output.status(),
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }
}
