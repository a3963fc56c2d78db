// rc file configuration (~/.rhos/rc)
//
// Plain `key=value` lines; `#` starts a comment. Known keys:
//   data.location=<path>   snapshot database (relative paths resolve against ~/.rhos)
//   role=<role>            default session role for views

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub data_location: Option<PathBuf>,
    pub role: Option<String>,
}

impl Config {
    /// Directory holding the rc file and the default database
    pub fn config_dir() -> Result<PathBuf> {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .context("Could not determine home directory")?;
        Ok(home.join(".rhos"))
    }

    pub fn rc_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("rc"))
    }

    /// Load the rc file; a missing file yields the defaults
    pub fn load() -> Result<Self> {
        let rc_path = Self::rc_path()?;
        if !rc_path.exists() {
            debug!("No rc file at {}, using defaults", rc_path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&rc_path)
            .with_context(|| format!("Failed to read config file: {}", rc_path.display()))?;
        Ok(Self::parse(&contents, rc_path.parent().unwrap_or(Path::new("."))))
    }

    /// Parse rc contents; relative paths resolve against `base_dir`
    pub fn parse(contents: &str, base_dir: &Path) -> Self {
        let mut config = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!("Ignoring malformed config line: {}", line);
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = Some(if path.is_relative() {
                        base_dir.join(path)
                    } else {
                        path
                    });
                }
                "role" => config.role = Some(value.to_string()),
                other => warn!("Ignoring unknown config key: {}", other),
            }
        }
        config
    }
}
