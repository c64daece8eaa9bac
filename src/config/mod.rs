// Sandbox limits and playground definitions, loaded from TOML

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bindings::{BindingError, BindingSet, BindingValue};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// Resource limits applied to each run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Heap limit for the interpreter, in bytes
    pub memory_limit: usize,

    /// Native stack limit for the interpreter, in bytes
    pub max_stack_size: usize,

    /// Wall-clock budget per run. `None` lets a run take as long as it needs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            memory_limit: 64 * 1024 * 1024,
            max_stack_size: 1024 * 1024,
            timeout_ms: None,
        }
    }
}

impl SandboxConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Where a binding's value comes from in a definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    /// Inline JavaScript expression
    Script(String),
    /// JavaScript expression read from a file, relative to the definition.
    /// The file holds one expression, as for [`BindingValue::Script`].
    ScriptFile(PathBuf),
    /// Inline data
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDefinition {
    pub name: String,
    #[serde(flatten)]
    pub source: BindingSource,
}

/// Everything a page supplies to embed one playground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaygroundDefinition {
    pub title: String,
    pub code: String,

    /// Rendering height hint, in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default)]
    pub bindings: Vec<BindingDefinition>,

    #[serde(skip)]
    base_dir: PathBuf,
}

/// Height hint used when a definition does not give one, in pixels.
pub const DEFAULT_HEIGHT: u32 = 400;

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

impl PlaygroundDefinition {
    pub fn new(title: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            code: code.into(),
            height: default_height(),
            bindings: Vec::new(),
            base_dir: PathBuf::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut definition: Self = read_toml(path)?;
        definition.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(definition)
    }

    /// Resolve the declared bindings, reading script files relative to the
    /// definition's directory.
    pub fn binding_set(&self) -> Result<BindingSet, ConfigError> {
        let mut set = BindingSet::new();
        for binding in &self.bindings {
            let value = match &binding.source {
                BindingSource::Script(source) => BindingValue::Script(source.clone()),
                BindingSource::ScriptFile(file) => {
                    let path = self.base_dir.join(file);
                    let source = fs::read_to_string(&path)
                        .map_err(|source| ConfigError::Io { path, source })?;
                    BindingValue::Script(source)
                }
                BindingSource::Json(value) => BindingValue::Json(value.clone()),
            };
            set.insert(binding.name.clone(), value)?;
        }
        Ok(set)
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
