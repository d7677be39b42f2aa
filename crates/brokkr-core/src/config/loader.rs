//! Configuration file loading and parsing

use crate::error::{Error, Result};
use crate::types::CoordinationConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["brokkr.yaml", "brokkr.yml"];

/// Loaded Brokkr configuration
#[derive(Debug, Clone)]
pub struct BrokkrConfig {
    /// The parsed configuration
    pub config: CoordinationConfig,

    /// Path to the configuration file, if one was read
    pub config_path: Option<PathBuf>,
}

impl BrokkrConfig {
    /// Load configuration from the specified path or search for it
    ///
    /// With no explicit path, searches the working directory for
    /// `brokkr.yaml` / `brokkr.yml` and falls back to built-in defaults
    /// when neither exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, content) = if let Some(p) = path {
            let content = fs::read_to_string(p).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::config_not_found(p.display().to_string())
                } else {
                    Error::Io(e)
                }
            })?;
            (Some(p.to_owned()), content)
        } else {
            match Self::find_config()? {
                Some((p, content)) => (Some(p), content),
                None => {
                    return Ok(Self {
                        config: CoordinationConfig::default(),
                        config_path: None,
                    })
                }
            }
        };

        let config: CoordinationConfig = serde_yaml_ng::from_str(&content)?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Search the working directory for a config file
    fn find_config() -> Result<Option<(PathBuf, String)>> {
        for name in CONFIG_FILE_NAMES {
            let candidate = PathBuf::from(name);
            if candidate.is_file() {
                let content = fs::read_to_string(&candidate)?;
                return Ok(Some((candidate, content)));
            }
        }
        Ok(None)
    }
}
