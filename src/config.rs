//! User configuration (`config.toml`).
//!
//! ```toml
//! version = "default"
//! normalize = "upper"            # identity | upper | lower
//! valid_pattern = "[A-Z]+[0-9]+" # names must match in full
//! ```

use directories::ProjectDirs;
use recalc_core::SheetOptions;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    version: Option<String>,
    normalize: Option<String>,
    valid_pattern: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Refusing to read {}: file too large ({} bytes, max {})",
        .path.display(),
        .len,
        MAX_CONFIG_FILE_BYTES
    )]
    TooLarge { path: PathBuf, len: u64 },

    #[error("Failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown normalize mode '{0}' (expected identity, upper or lower)")]
    UnknownNormalize(String),

    #[error("Invalid valid_pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// How cell names are canonicalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalizeMode {
    #[default]
    Identity,
    Upper,
    Lower,
}

impl FromStr for NormalizeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" | "none" => Ok(NormalizeMode::Identity),
            "upper" => Ok(NormalizeMode::Upper),
            "lower" => Ok(NormalizeMode::Lower),
            _ => Err(ConfigError::UnknownNormalize(s.to_string())),
        }
    }
}

impl fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizeMode::Identity => "identity",
            NormalizeMode::Upper => "upper",
            NormalizeMode::Lower => "lower",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub version: String,
    pub normalize: NormalizeMode,
    /// Anchored form of `valid_pattern`.
    pub valid_pattern: Option<Regex>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: SheetOptions::default().version,
            normalize: NormalizeMode::default(),
            valid_pattern: None,
        }
    }
}

impl Config {
    pub fn sheet_options(&self) -> SheetOptions {
        let mut options = SheetOptions::new(self.version.clone());
        match self.normalize {
            NormalizeMode::Identity => {}
            NormalizeMode::Upper => options = options.with_normalizer(|s: &str| s.to_uppercase()),
            NormalizeMode::Lower => options = options.with_normalizer(|s: &str| s.to_lowercase()),
        }
        if let Some(re) = self.valid_pattern.clone() {
            options = options.with_validator(move |s: &str| re.is_match(s));
        }
        options
    }
}

/// Compile `pattern` so that it must match a whole name.
pub fn full_match_regex(pattern: &str) -> Result<Regex, ConfigError> {
    Ok(Regex::new(&format!("^(?:{pattern})$"))?)
}

/// Load the config from `config_file`, or from the user config dir when none is given.
///
/// Problems never stop the program: each one becomes a warning and the
/// affected setting keeps its default.
pub fn load_config(config_file: Option<&PathBuf>, use_user_config: bool) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = Config::default();

    let path = match config_file {
        Some(path) => Some(path.clone()),
        None if use_user_config => user_config_path(),
        None => None,
    };
    let Some(path) = path else {
        return (config, warnings);
    };
    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (config, warnings);
    }

    let file = match read_config_file(&path) {
        Ok(file) => file,
        Err(err) => {
            warnings.push(err.to_string());
            return (config, warnings);
        }
    };
    log::debug!("Loaded config from {}", path.display());

    if let Some(version) = file.version {
        config.version = version;
    }
    if let Some(mode) = file.normalize {
        match mode.parse() {
            Ok(mode) => config.normalize = mode,
            Err(err) => warnings.push(format!("{}: {}", path.display(), err)),
        }
    }
    if let Some(pattern) = file.valid_pattern {
        match full_match_regex(&pattern) {
            Ok(re) => config.valid_pattern = Some(re),
            Err(err) => warnings.push(format!("{}: {}", path.display(), err)),
        }
    }

    (config, warnings)
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let meta = std::fs::metadata(path).map_err(io_error)?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            len: meta.len(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(io_error)?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "recalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
