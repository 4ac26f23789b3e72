use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::labels::SmellKind;
use crate::repository::SCRATCH_DIRS;

/// Top-level smellsplit configuration, matching `smellsplit.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default)]
    pub workspace: WorkspaceSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub decomposer: DecomposerSection,
    #[serde(default)]
    pub selection: SelectionSection,
    #[serde(default = "default_smells")]
    pub smells: Vec<TrackedSmell>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            workspace: WorkspaceSection::default(),
            store: StoreSection::default(),
            decomposer: DecomposerSection::default(),
            selection: SelectionSection::default(),
            smells: default_smells(),
        }
    }
}

impl SplitConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smells.is_empty() {
            return Err(ConfigError::Invalid("no smells are tracked".into()));
        }
        let mut seen = HashSet::new();
        for smell in &self.smells {
            if smell.name.trim().is_empty() {
                return Err(ConfigError::Invalid("smell name is empty".into()));
            }
            if smell.name.contains(['/', '\\'])
                || matches!(smell.name.as_str(), "." | "..")
                || SCRATCH_DIRS.contains(&smell.name.as_str())
            {
                return Err(ConfigError::Invalid(format!(
                    "smell `{}` cannot be used as a dataset directory name",
                    smell.name
                )));
            }
            if !seen.insert(smell.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "smell `{}` is listed twice",
                    smell.name
                )));
            }
        }
        if self.decomposer.command.is_empty() {
            return Err(ConfigError::Invalid("decomposer.command is empty".into()));
        }
        if self.selection.min_severity < 0.0 {
            return Err(ConfigError::Invalid(
                "selection.min_severity must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Look up a tracked smell by name.
    pub fn smell(&self, name: &str) -> Option<&TrackedSmell> {
        self.smells.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSection {
    pub root: PathBuf,
    /// Run inside `root/<unix-timestamp>` instead of `root` directly.
    pub timestamped: bool,
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("smellsplit-work"),
            timestamped: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("labels.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposerSection {
    /// Program and leading arguments; `-i/-m/-o` are appended per call.
    pub command: Vec<String>,
}

impl Default for DecomposerSection {
    fn default() -> Self {
        Self {
            command: vec![
                "java".into(),
                "-Xmx6g".into(),
                "-jar".into(),
                "CodeSplitJava.jar".into(),
            ],
        }
    }
}

/// Filter applied when paging candidate repositories out of the label store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSection {
    pub smell: String,
    pub min_severity: f64,
    pub language: String,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            smell: "Multifaceted Abstraction".into(),
            min_severity: 7.0,
            language: "java".into(),
        }
    }
}

/// A smell name the dataset is built for, with the granularity its labels carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSmell {
    pub name: String,
    pub kind: SmellKind,
}

impl TrackedSmell {
    pub fn new(name: &str, kind: SmellKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

fn default_smells() -> Vec<TrackedSmell> {
    vec![
        TrackedSmell::new("Multifaceted Abstraction", SmellKind::Design),
        TrackedSmell::new("Magic Number", SmellKind::Implementation),
        TrackedSmell::new("Empty catch clause", SmellKind::Implementation),
        TrackedSmell::new("Complex Method", SmellKind::Implementation),
    ]
}
