use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::DEFAULT_DESCRIPTION_WIDTH;
use crate::task::DisplayStyle;

pub const DEFAULT_TASKS_FILE: &str = "tasks.json";
pub const CONFIG_FILENAME: &str = ".tasktrack.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Task file. Relative paths resolve against the directory holding the config.
    pub file: Option<String>,
    /// `plain` or `decorated` priority labels.
    pub style: Option<DisplayStyle>,
    /// Characters of description shown by `list` before truncation.
    pub description_width: Option<usize>,
}

impl TrackerConfig {
    pub fn starter() -> Self {
        Self {
            file: Some(DEFAULT_TASKS_FILE.to_string()),
            style: Some(DisplayStyle::Decorated),
            description_width: Some(DEFAULT_DESCRIPTION_WIDTH),
        }
    }
}

/// Settings after layering flags, project config, global config and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub file: PathBuf,
    pub style: DisplayStyle,
    pub description_width: usize,
}

/// Values given on the command line; they win over every config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub file: Option<PathBuf>,
    pub style: Option<DisplayStyle>,
}

pub fn config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(CONFIG_FILENAME)
}

pub fn global_config_path(tasktrack_home: &Path) -> PathBuf {
    tasktrack_home.join("config.toml")
}

pub fn find_config_root(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|candidate| candidate.join(CONFIG_FILENAME).is_file())
        .map(Path::to_path_buf)
}

pub fn load_config_file(path: &Path) -> Result<Option<TrackerConfig>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let config = toml::from_str::<TrackerConfig>(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(config))
}

pub fn write_config(repo_root: &Path, config: &TrackerConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path(repo_root);
    let body = toml::to_string_pretty(config)?;
    fs::write(&path, body)?;
    Ok(path)
}

/// A loaded config together with the directory its relative paths hang off.
struct Layer {
    base: PathBuf,
    config: TrackerConfig,
}

impl Layer {
    fn file(&self) -> Option<PathBuf> {
        self.config
            .file
            .as_deref()
            .map(str::trim)
            .filter(|file| !file.is_empty())
            .map(|file| self.base.join(file))
    }
}

pub fn resolve_settings(
    cwd: &Path,
    tasktrack_home: Option<&Path>,
    overrides: &Overrides,
) -> Result<Settings, ConfigError> {
    let mut layers = Vec::new();
    if let Some(root) = find_config_root(cwd) {
        if let Some(config) = load_config_file(&config_path(&root))? {
            layers.push(Layer { base: root, config });
        }
    }
    if let Some(home) = tasktrack_home {
        if let Some(config) = load_config_file(&global_config_path(home))? {
            layers.push(Layer {
                base: home.to_path_buf(),
                config,
            });
        }
    }

    let file = overrides
        .file
        .as_ref()
        .map(|file| cwd.join(file))
        .or_else(|| layers.iter().find_map(Layer::file))
        .unwrap_or_else(|| cwd.join(DEFAULT_TASKS_FILE));
    let style = overrides
        .style
        .or_else(|| layers.iter().find_map(|layer| layer.config.style))
        .unwrap_or_default();
    let description_width = layers
        .iter()
        .find_map(|layer| layer.config.description_width)
        .filter(|width| *width > 0)
        .unwrap_or(DEFAULT_DESCRIPTION_WIDTH);

    Ok(Settings {
        file,
        style,
        description_width,
    })
}
