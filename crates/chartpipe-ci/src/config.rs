//! Pipeline configuration
//!
//! CI variables are read once into [`CiEnvironment`] so the rest of the
//! pipeline never touches the process environment directly.

use std::fmt;
use std::path::PathBuf;
use url::Url;

use crate::error::{CiError, Result};

pub const DEFAULT_REGISTRY_HOST: &str = "registry.example.com";
pub const DEFAULT_REGISTRY_OWNER: &str = "homelab";
pub const DEFAULT_REGISTRY_PROJECT: &str = "helm-charts";
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Paths and binaries shared by every pipeline step
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub charts_dir: PathBuf,
    pub packages_dir: PathBuf,
    pub helm_bin: String,
    pub git_bin: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            charts_dir: PathBuf::from("charts"),
            packages_dir: PathBuf::from(".packages"),
            helm_bin: "helm".to_string(),
            git_bin: "git".to_string(),
        }
    }
}

/// Snapshot of the CI variables the pipeline reads
#[derive(Clone, Default)]
pub struct CiEnvironment {
    /// `CI` is set
    pub ci: bool,
    pub commit_tag: Option<String>,
    pub release_all: bool,
    pub commit_branch: Option<String>,
    pub commit_before_sha: Option<String>,
    pub merge_request_target: Option<String>,
    pub commit_short_sha: Option<String>,
    pub commit_ref_name: Option<String>,
    pub registry: Option<String>,
    pub registry_image: Option<String>,
    pub registry_user: Option<String>,
    pub registry_password: Option<String>,
    pub registry_host: Option<String>,
    pub registry_owner: Option<String>,
    pub registry_project: Option<String>,
    pub discord_webhook_url: Option<String>,
}

impl CiEnvironment {
    /// Read from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            ci: get("CI").is_some(),
            commit_tag: get("CI_COMMIT_TAG"),
            release_all: get("RELEASE_ALL").is_some(),
            commit_branch: get("CI_COMMIT_BRANCH"),
            commit_before_sha: get("CI_COMMIT_BEFORE_SHA"),
            merge_request_target: get("CI_MERGE_REQUEST_TARGET_BRANCH_NAME"),
            commit_short_sha: get("CI_COMMIT_SHORT_SHA"),
            commit_ref_name: get("CI_COMMIT_REF_NAME"),
            registry: get("CI_REGISTRY"),
            registry_image: get("CI_REGISTRY_IMAGE"),
            registry_user: get("CI_REGISTRY_USER"),
            registry_password: get("CI_REGISTRY_PASSWORD"),
            registry_host: get("REGISTRY_HOST"),
            registry_owner: get("REGISTRY_OWNER"),
            registry_project: get("REGISTRY_PROJECT"),
            discord_webhook_url: get("DISCORD_WEBHOOK_URL"),
        }
    }

    /// Branch the change detector compares feature branches against
    pub fn base_branch(&self) -> &str {
        self.merge_request_target
            .as_deref()
            .unwrap_or(DEFAULT_BASE_BRANCH)
    }

    /// Where charts get published
    ///
    /// An explicit override wins, then `CI_REGISTRY_IMAGE`, then
    /// `REGISTRY_HOST/REGISTRY_OWNER/REGISTRY_PROJECT`.
    pub fn registry_target(&self, explicit: Option<&str>) -> Result<RegistryTarget> {
        if let Some(reference) = explicit {
            return RegistryTarget::parse(reference);
        }
        if let Some(image) = &self.registry_image {
            tracing::info!("Using CI_REGISTRY_IMAGE: {}", image);
            return RegistryTarget::parse(image);
        }

        let reference = format!(
            "{}/{}/{}",
            self.registry_host.as_deref().unwrap_or(DEFAULT_REGISTRY_HOST),
            self.registry_owner.as_deref().unwrap_or(DEFAULT_REGISTRY_OWNER),
            self.registry_project.as_deref().unwrap_or(DEFAULT_REGISTRY_PROJECT),
        );
        tracing::info!("Using configured registry: oci://{}", reference);
        RegistryTarget::parse(&reference)
    }

    /// Login credentials, failing on the first missing variable
    pub fn credentials(&self, target: &RegistryTarget) -> Result<RegistryCredentials> {
        let missing = |variable: &str| CiError::MissingCredential {
            variable: variable.to_string(),
        };

        let username = self
            .registry_user
            .clone()
            .ok_or_else(|| missing("CI_REGISTRY_USER"))?;
        let password = self
            .registry_password
            .clone()
            .ok_or_else(|| missing("CI_REGISTRY_PASSWORD"))?;

        Ok(RegistryCredentials {
            host: self
                .registry
                .clone()
                .unwrap_or_else(|| target.host().to_string()),
            username,
            password,
        })
    }

    /// Credentials only when both user and password are present
    pub fn optional_credentials(&self, target: &RegistryTarget) -> Option<RegistryCredentials> {
        self.credentials(target).ok()
    }
}

impl fmt::Debug for CiEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CiEnvironment")
            .field("ci", &self.ci)
            .field("commit_tag", &self.commit_tag)
            .field("release_all", &self.release_all)
            .field("commit_branch", &self.commit_branch)
            .field("commit_before_sha", &self.commit_before_sha)
            .field("merge_request_target", &self.merge_request_target)
            .field("registry", &self.registry)
            .field("registry_image", &self.registry_image)
            .field("registry_user", &self.registry_user)
            .field("registry_password", &self.registry_password.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

/// An OCI repository charts are pushed into, e.g. `oci://ghcr.io/acme/charts`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryTarget {
    /// Host with optional port
    host: String,
    /// Repository path below the host, without slashes at either end
    path: String,
}

impl RegistryTarget {
    /// Parse `[oci://]host[:port][/path]`
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = |reason: &str| CiError::InvalidRegistry {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let bare = reference.trim().trim_start_matches("oci://").trim_end_matches('/');
        if bare.is_empty() {
            return Err(invalid("empty reference"));
        }
        if bare.contains("://") {
            return Err(invalid("only oci:// references are supported"));
        }

        let url = Url::parse(&format!("oci://{}", bare)).map_err(|e| invalid(&e.to_string()))?;
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            host,
            path: url.path().trim_matches('/').to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `host/path` without scheme
    pub fn repository(&self) -> String {
        if self.path.is_empty() {
            self.host.clone()
        } else {
            format!("{}/{}", self.host, self.path)
        }
    }

    /// `oci://host/path`, as `helm push` expects
    pub fn oci_url(&self) -> String {
        format!("oci://{}", self.repository())
    }

    /// Full reference of one chart version, `host/path/name:version`
    pub fn chart_reference(&self, name: &str, version: &str) -> String {
        format!("{}/{}:{}", self.repository(), name, version)
    }
}

impl fmt::Display for RegistryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.oci_url())
    }
}

/// Registry login data
#[derive(Clone)]
pub struct RegistryCredentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
