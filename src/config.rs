use crate::{
    background::{Color, DEFAULT_DENSITY},
    store::validate_collection,
};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

const DEFAULT_COLLECTION: &str = "responses";
const DEFAULT_FRAME_RATE: u32 = 30;
const DEFAULT_BACKDROP: Color = Color::new(0x1e, 0x14, 0x21);
const MAX_FRAME_RATE: u32 = 120;
const LOG_FILE_NAME: &str = "petalform.log";

pub(crate) const STORE_PATH_ENV: &str = "PETALFORM_STORE_PATH";
pub(crate) const COLLECTION_ENV: &str = "PETALFORM_COLLECTION";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// The survey to present instead of the built-in one.
    #[serde(default)]
    pub(crate) survey: Option<PathBuf>,

    #[serde(default)]
    pub(crate) store: StoreConfig,

    #[serde(default)]
    pub(crate) background: BackgroundConfig,

    #[serde(default)]
    pub(crate) logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StoreConfig {
    /// The directory collections are written to.
    #[serde(default)]
    pub(crate) path: Option<PathBuf>,

    #[serde(default = "default_collection")]
    pub(crate) collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: None, collection: default_collection() }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BackgroundConfig {
    /// Viewport units of width per petal.
    #[serde(default = "default_density")]
    pub(crate) density: f32,

    #[serde(default = "default_frame_rate")]
    pub(crate) frame_rate: u32,

    #[serde(default = "default_backdrop")]
    pub(crate) backdrop: Color,
}

impl BackgroundConfig {
    pub(crate) fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self { density: default_density(), frame_rate: default_frame_rate(), backdrop: default_backdrop() }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LoggingConfig {
    #[serde(default)]
    pub(crate) path: Option<PathBuf>,

    /// A filter directive such as `info` or `petalform=debug`.
    #[serde(default = "default_level")]
    pub(crate) level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { path: None, level: default_level() }
    }
}

impl Config {
    /// Load the config at the given path, or at the default location when none is given.
    ///
    /// A missing file at the default location yields the default config.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_file(&path)?,
                _ => Self::default(),
            },
        };
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.into(), e))?;
        Self::from_yaml(&contents)
    }

    pub(crate) fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // An empty file is a valid config with nothing in it.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    pub(crate) fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Apply overrides taken from the environment.
    pub(crate) fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(STORE_PATH_ENV).filter(|path| !path.is_empty()) {
            self.store.path = Some(path.into());
        }
        if let Some(collection) = lookup(COLLECTION_ENV) {
            self.store.collection = collection;
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let density = self.background.density;
        if !density.is_finite() || density <= 0.0 {
            return Err(ConfigError::InvalidDensity(density));
        }
        let frame_rate = self.background.frame_rate;
        if !(1..=MAX_FRAME_RATE).contains(&frame_rate) {
            return Err(ConfigError::InvalidFrameRate(frame_rate));
        }
        validate_collection(&self.store.collection)
            .map_err(|_| ConfigError::InvalidCollection(self.store.collection.clone()))?;
        Ok(())
    }

    /// The directory documents are stored in.
    pub(crate) fn store_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).ok_or(ConfigError::NoHomeDirectory),
        }
    }

    /// The file logs are written to while the form is on screen.
    pub(crate) fn log_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.logging.path {
            Some(path) => Ok(path.clone()),
            None => project_dirs()
                .map(|dirs| dirs.data_local_dir().join(LOG_FILE_NAME))
                .ok_or(ConfigError::NoHomeDirectory),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "petalform")
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_density() -> f32 {
    DEFAULT_DENSITY
}

fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}

fn default_backdrop() -> Color {
    DEFAULT_BACKDROP
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading '{0}': {1}")]
    Io(PathBuf, io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("background density must be a positive number, got {0}")]
    InvalidDensity(f32),

    #[error("frame rate must be between 1 and {MAX_FRAME_RATE}, got {0}")]
    InvalidFrameRate(u32),

    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),

    #[error("could not find a home directory, set the store and log paths explicitly")]
    NoHomeDirectory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = Config::from_yaml("").expect("parse failed");
        assert_eq!(config.store.collection, "responses");
        assert_eq!(config.background.density, 15.0);
        assert_eq!(config.background.frame_rate, 30);
        assert_eq!(config.background.backdrop, Color::new(0x1e, 0x14, 0x21));
        assert_eq!(config.logging.level, "info");
        assert!(config.survey.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_config() {
        let input = r##"
survey: /tmp/survey.yaml
store:
  path: /var/lib/petalform
  collection: pilot
background:
  density: 30
  frame_rate: 60
  backdrop: "#000000"
logging:
  level: debug
"##;
        let config = Config::from_yaml(input).expect("parse failed");
        assert_eq!(config.survey.as_deref(), Some(Path::new("/tmp/survey.yaml")));
        assert_eq!(config.store_path().expect("no store path"), Path::new("/var/lib/petalform"));
        assert_eq!(config.store.collection, "pilot");
        assert_eq!(config.background.density, 30.0);
        assert_eq!(config.background.frame_interval(), Duration::from_secs(1) / 60);
        assert_eq!(config.background.backdrop, Color::new(0, 0, 0));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn unknown_keys_rejected() {
        let result = Config::from_yaml("background:\n  speed: 3\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_backdrop_rejected() {
        let result = Config::from_yaml("background:\n  backdrop: pink\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[rstest]
    #[case::zero_density("background:\n  density: 0\n")]
    #[case::negative_density("background:\n  density: -2\n")]
    #[case::no_frame_rate("background:\n  frame_rate: 0\n")]
    #[case::fast_frame_rate("background:\n  frame_rate: 121\n")]
    #[case::empty_collection("store:\n  collection: ''\n")]
    #[case::nested_collection("store:\n  collection: a/b\n")]
    fn invalid_values(#[case] input: &str) {
        let config = Config::from_yaml(input).expect("parse failed");
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_overrides() {
        let vars = HashMap::from([(STORE_PATH_ENV, "/srv/answers"), (COLLECTION_ENV, "trial")]);
        let mut config = Config::default();
        config.apply_env(|name| vars.get(name).map(|value| value.to_string()));
        assert_eq!(config.store.path.as_deref(), Some(Path::new("/srv/answers")));
        assert_eq!(config.store.collection, "trial");
    }

    #[test]
    fn missing_explicit_file() {
        let result = Config::load(Some(Path::new("/definitely/not/here.yaml")));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }
}
