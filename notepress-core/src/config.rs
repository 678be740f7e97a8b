//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Main configuration struct matching the notepress.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub publish: PublishConfig,

    /// Source-relative path of the document that becomes the site home page
    #[serde(default = "default_home_document")]
    pub home_document: PathBuf,

    #[serde(default)]
    pub search_page: SearchPageConfig,

    #[serde(default)]
    pub links: LinksConfig,

    #[serde(default)]
    pub slugify_filenames: bool,

    #[serde(default = "default_true")]
    pub clean_output: bool,

    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub indexnow: IndexNowConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    String::from("/")
}

fn default_home_document() -> PathBuf {
    PathBuf::from("index.md")
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "markdown".to_string()]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_source")]
    pub source: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from("content/notes")
}

fn default_output() -> PathBuf {
    PathBuf::from("site-content")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
        }
    }
}

/// Which documents are published and how the marker is treated afterwards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Also accept a boolean `publish: true` key
    #[serde(default = "default_true")]
    pub honor_publish_flag: bool,

    /// Drop the marker tag (and the publish flag) from emitted front matter
    #[serde(default = "default_true")]
    pub strip_marker: bool,
}

fn default_marker() -> String {
    String::from("publish")
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            honor_publish_flag: true,
            strip_marker: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPageConfig {
    #[serde(default = "default_search_path")]
    pub path: PathBuf,

    #[serde(default = "default_search_title")]
    pub title: String,

    #[serde(default = "default_search_layout")]
    pub layout: String,
}

fn default_search_path() -> PathBuf {
    PathBuf::from("search.md")
}

fn default_search_title() -> String {
    String::from("Search")
}

fn default_search_layout() -> String {
    String::from("search")
}

impl Default for SearchPageConfig {
    fn default() -> Self {
        Self {
            path: default_search_path(),
            title: default_search_title(),
            layout: default_search_layout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_true")]
    pub rewrite_md_links: bool,

    #[serde(default = "default_true")]
    pub rewrite_wikilinks: bool,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            rewrite_md_links: true,
            rewrite_wikilinks: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexNowConfig {
    #[serde(default = "default_indexnow_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_indexnow_endpoint() -> String {
    String::from("https://api.indexnow.org/indexnow")
}

fn default_batch_size() -> usize {
    10_000
}

impl Default for IndexNowConfig {
    fn default() -> Self {
        Self {
            endpoint: default_indexnow_endpoint(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            base_url: default_base_url(),
            publish: PublishConfig::default(),
            home_document: default_home_document(),
            search_page: SearchPageConfig::default(),
            links: LinksConfig::default(),
            slugify_filenames: false,
            clean_output: true,
            ignore_patterns: Vec::new(),
            extensions: default_extensions(),
            indexnow: IndexNowConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit, which serde rejects for a struct
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the config file if it exists, otherwise fall back to defaults
    /// rooted at the directory the file would have lived in.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        tracing::debug!("No config at {:?}; using defaults", path);
        let mut config = Config::default();
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.publish.marker.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "publish.marker".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.home_document.is_absolute() {
            return Err(ConfigError::InvalidValue {
                field: "home_document".into(),
                reason: "must be relative to the source directory".into(),
            });
        }
        let escapes = self
            .search_page
            .path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || self.search_page.path.file_name().is_none() {
            return Err(ConfigError::InvalidValue {
                field: "search_page.path".into(),
                reason: "must be a file path inside the output directory".into(),
            });
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extensions".into(),
                reason: "at least one extension is required".into(),
            });
        }
        if self.indexnow.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "indexnow.batch_size".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Get the source directory, resolved relative to config file
    pub fn source_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.source)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Override the source directory (absolute or relative to the working directory)
    pub fn set_source_dir(&mut self, dir: PathBuf) {
        self.paths.source = absolute_or_cwd(dir);
    }

    /// Override the output directory (absolute or relative to the working directory)
    pub fn set_output_dir(&mut self, dir: PathBuf) {
        self.paths.output = absolute_or_cwd(dir);
    }

    /// `base_url` when it is an absolute http(s) URL
    pub fn absolute_base_url(&self) -> Option<&str> {
        let base = self.base_url.trim();
        (base.starts_with("https://") || base.starts_with("http://")).then_some(base)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}

fn absolute_or_cwd(dir: PathBuf) -> PathBuf {
    if dir.is_absolute() {
        return dir;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(dir),
        Err(_) => dir,
    }
}
