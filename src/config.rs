use crate::prelude::*;

use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    #[serde(default = "Config::default_slave_id")]
    pub slave_id: u8,

    #[serde(default = "Config::default_capture_dir")]
    pub capture_dir: String,

    /// Optional path to append decoded snapshots to, one JSON object per line
    pub datalog_file: Option<String>,

    #[serde(default)]
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: Self::default_loglevel(),
            slave_id: Self::default_slave_id(),
            capture_dir: Self::default_capture_dir(),
            datalog_file: None,
            pretty: false,
        }
    }
}

impl Config {
    pub fn new(file: &str) -> Result<Self> {
        info!("Reading configuration from {}", file);
        let content = std::fs::read_to_string(file)
            .map_err(|err| file_error!("error reading {}: {}", file, err))?;

        let config: Self =
            serde_yaml::from_str(&content).with_context(|| format!("error parsing {}", file))?;

        debug!("Configuration loaded:");
        debug!("  Log Level: {}", config.loglevel);
        debug!("  Slave ID: {}", config.slave_id);
        debug!("  Capture Dir: {}", config.capture_dir);
        debug!("  Datalog File: {}", config.datalog_file.as_deref().unwrap_or("none"));

        config.validate()?;
        Ok(config)
    }

    /// Loads the named file, which must exist. With no name the default file
    /// is read if present, otherwise defaults are used.
    pub fn load(file: Option<&str>) -> Result<Self> {
        match file {
            Some(file) => Self::new(file),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::new(DEFAULT_CONFIG_FILE),
            None => {
                debug!("{} not found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        // 0 is broadcast, 248-255 are reserved
        if !(1..=247).contains(&self.slave_id) {
            bail!("slave_id must be between 1 and 247");
        }
        if self.capture_dir.is_empty() {
            bail!("capture_dir cannot be empty");
        }
        Ok(())
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_slave_id() -> u8 {
        crate::renogy::frame::DEFAULT_SLAVE_ID
    }

    fn default_capture_dir() -> String {
        "captures".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(yaml.as_bytes())?;
        Ok(file)
    }

    fn path(file: &NamedTempFile) -> Result<&str> {
        file.path().to_str().ok_or_else(|| anyhow!("non utf-8 temp path"))
    }

    #[test]
    fn defaults() -> Result<()> {
        let file = write_config("{}")?;
        let config = Config::new(path(&file)?)?;

        assert_eq!(config.loglevel, "info");
        assert_eq!(config.slave_id, 1);
        assert_eq!(config.capture_dir, "captures");
        assert_eq!(config.datalog_file, None);
        assert!(!config.pretty);
        Ok(())
    }

    #[test]
    fn full_config() -> Result<()> {
        let file = write_config(
            "loglevel: debug\n\
             slave_id: 16\n\
             capture_dir: /var/lib/renogy\n\
             datalog_file: /tmp/renogy.json\n\
             pretty: true\n",
        )?;
        let config = Config::new(path(&file)?)?;

        assert_eq!(config.loglevel, "debug");
        assert_eq!(config.slave_id, 16);
        assert_eq!(config.capture_dir, "/var/lib/renogy");
        assert_eq!(config.datalog_file.as_deref(), Some("/tmp/renogy.json"));
        assert!(config.pretty);
        Ok(())
    }

    #[test]
    fn invalid_slave_id() -> Result<()> {
        for yaml in ["slave_id: 0", "slave_id: 248"] {
            let file = write_config(yaml)?;
            assert!(Config::new(path(&file)?).is_err(), "{yaml}");
        }
        Ok(())
    }

    #[test]
    fn unknown_key() -> Result<()> {
        let file = write_config("slave: 2")?;
        assert!(Config::new(path(&file)?).is_err());
        Ok(())
    }

    #[test]
    fn missing_named_file() {
        assert!(Config::load(Some("/nonexistent/renogy.yaml")).is_err());
    }
}
