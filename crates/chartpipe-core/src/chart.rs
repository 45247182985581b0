//! Chart definition and loading

use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// File name of the chart manifest
pub const CHART_FILE: &str = "Chart.yaml";

/// File name of the default values
pub const VALUES_FILE: &str = "values.yaml";

/// Parsed `Chart.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// API version (v1 or v2)
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Chart name (required)
    pub name: String,

    /// Chart version (required, SemVer)
    #[serde(with = "version_serde")]
    pub version: Version,

    /// Application version
    #[serde(default, deserialize_with = "scalar_string::deserialize")]
    pub app_version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Kubernetes version constraint
    #[serde(default)]
    pub kube_version: Option<String>,

    /// Chart type
    #[serde(default, rename = "type")]
    pub kind: ChartKind,

    #[serde(default)]
    pub home: Option<String>,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub maintainers: Vec<Maintainer>,

    #[serde(default)]
    pub dependencies: Vec<ChartDependency>,

    #[serde(default)]
    pub annotations: IndexMap<String, String>,
}

fn default_api_version() -> String {
    "v2".to_string()
}

impl ChartMetadata {
    /// Parse metadata from YAML text
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        if !value.is_mapping() {
            return Err(CoreError::InvalidChart {
                path: origin.display().to_string(),
                message: "expected a mapping at the top level".to_string(),
            });
        }

        serde_yaml::from_value(value).map_err(|e| CoreError::InvalidChart {
            path: origin.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Whether the chart declares subchart dependencies
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }

    /// File name `helm package` produces for this chart
    pub fn archive_name(&self) -> String {
        format!("{}-{}.tgz", self.name, self.version)
    }
}

/// Chart type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Application,
    Library,
}

/// Maintainer information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A subchart dependency as declared in `Chart.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDependency {
    pub name: String,

    /// Version constraint
    #[serde(default, deserialize_with = "scalar_string::deserialize")]
    pub version: Option<String>,

    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// A chart loaded from disk
#[derive(Debug, Clone)]
pub struct LoadedChart {
    /// Directory name, the chart's identity
    pub dir_name: String,

    /// Chart root
    pub root: PathBuf,

    pub metadata: ChartMetadata,
}

impl LoadedChart {
    /// Load a chart from its directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(CoreError::ChartNotFound {
                path: root.display().to_string(),
            });
        }

        let chart_file = root.join(CHART_FILE);
        if !chart_file.is_file() {
            return Err(CoreError::ChartYamlMissing {
                path: root.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&chart_file)?;
        let metadata = ChartMetadata::from_yaml(&content, &chart_file)?;

        let dir_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| metadata.name.clone());

        Ok(Self {
            dir_name,
            root,
            metadata,
        })
    }

    /// Path to `Chart.yaml`
    pub fn chart_file(&self) -> PathBuf {
        self.root.join(CHART_FILE)
    }

    /// Path to `values.yaml`
    pub fn values_file(&self) -> PathBuf {
        self.root.join(VALUES_FILE)
    }

    /// Check that `Chart.yaml` declares the same name as the directory
    pub fn check_name(&self) -> Result<()> {
        if self.metadata.name != self.dir_name {
            return Err(CoreError::NameMismatch {
                directory: self.dir_name.clone(),
                declared: self.metadata.name.clone(),
            });
        }
        Ok(())
    }
}

mod version_serde {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(version: &Version, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&version.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Version, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // `helm package` puts the raw string in the archive name
        if s.starts_with('v') {
            return Err(serde::de::Error::custom(format!(
                "version {:?} must not have a leading 'v'",
                s
            )));
        }
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// YAML happily reads `appVersion: 1.16` as a float
mod scalar_string {
    use serde::{Deserialize, Deserializer};
    use serde_yaml::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected a scalar, found {:?}",
                other
            ))),
        }
    }
}
