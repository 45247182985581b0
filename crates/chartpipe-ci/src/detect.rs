//! Changed chart detection
//!
//! Picks a git revision range from the CI context, lists changed files and
//! maps them to top-level chart directories.

use serde::Serialize;
use std::fmt;

use chartpipe_core::ChartsDir;

use crate::config::CiEnvironment;
use crate::error::Result;
use crate::git::GitClient;

const NULL_SHA: &str = "0000000000000000000000000000000000000000";
const FETCH_DEPTH: u32 = 50;

/// What to compare
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffScope {
    /// Every chart, for the given reason
    All(String),
    /// A git range such as `origin/main...HEAD`
    Range(String),
}

impl fmt::Display for DiffScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffScope::All(reason) => write!(f, "all charts ({})", reason),
            DiffScope::Range(range) => f.write_str(range),
        }
    }
}

/// Result of a detection run
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub charts: Vec<String>,
    #[serde(skip)]
    pub scope: DiffScope,
}

impl Detection {
    /// One chart per line, with a trailing newline when non-empty
    pub fn to_text(&self) -> String {
        let mut out = self.charts.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// `{"charts": [...]}`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct ChangeDetector<'a> {
    git: GitClient<'a>,
    charts: ChartsDir,
    env: &'a CiEnvironment,
    base_override: Option<String>,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(git: GitClient<'a>, charts: ChartsDir, env: &'a CiEnvironment) -> Self {
        Self {
            git,
            charts,
            env,
            base_override: None,
        }
    }

    /// Always compare `<base>...HEAD`, ignoring the CI context
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base_override = Some(base.into());
        self
    }

    /// Decide which range to diff
    pub fn scope(&self) -> DiffScope {
        if let Some(base) = &self.base_override {
            return DiffScope::Range(format!("{}...HEAD", base));
        }

        if let Some(tag) = &self.env.commit_tag {
            tracing::info!("Tag detected: {} - will process all charts", tag);
            return DiffScope::All(format!("tag {}", tag));
        }

        if self.env.release_all {
            tracing::info!("RELEASE_ALL is set - will process all charts");
            return DiffScope::All("RELEASE_ALL".to_string());
        }

        if matches!(self.env.commit_branch.as_deref(), Some("main" | "master")) {
            return match self.env.commit_before_sha.as_deref() {
                Some(sha) if sha != NULL_SHA => {
                    tracing::info!("Main branch: comparing {}..HEAD", sha);
                    DiffScope::Range(format!("{}..HEAD", sha))
                }
                _ => {
                    tracing::info!("Main branch (single commit): comparing HEAD~1..HEAD");
                    DiffScope::Range("HEAD~1..HEAD".to_string())
                }
            };
        }

        let base = self.env.base_branch();
        if self.env.ci {
            tracing::info!("Fetching base ref: {}", base);
            if let Err(e) = self.git.fetch("origin", base, FETCH_DEPTH) {
                tracing::warn!("Failed to fetch {}: {}", base, e);
            }
        }

        let remote_ref = format!("origin/{}", base);
        match self.git.rev_exists(&remote_ref) {
            Ok(true) => {
                tracing::info!("Comparing against base ref: {}", remote_ref);
                DiffScope::Range(format!("{}...HEAD", remote_ref))
            }
            _ => {
                tracing::warn!("Could not find {}, comparing with HEAD~1", remote_ref);
                DiffScope::Range("HEAD~1..HEAD".to_string())
            }
        }
    }

    /// Changed charts, sorted
    pub fn detect(&self) -> Result<Detection> {
        let scope = self.scope();

        let charts = match &scope {
            DiffScope::All(_) => self.charts.all()?,
            DiffScope::Range(range) => {
                let files = match self.git.changed_files(range) {
                    Ok(files) => files,
                    Err(e) => {
                        tracing::warn!("Failed to get changed files for {}: {}", range, e);
                        Vec::new()
                    }
                };

                if files.is_empty() {
                    tracing::warn!("No files changed in {}", range);
                }

                self.charts.charts_for_paths(&files).into_iter().collect()
            }
        };

        if charts.is_empty() {
            tracing::warn!("No charts changed");
        } else {
            tracing::info!("Changed charts: {}", charts.join(", "));
        }

        Ok(Detection { charts, scope })
    }
}
