//! Configuration loading utilities.

use crate::schema::Config;
use dmviz_common::{DmVizError, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "DMVIZ_CONFIG_PATH";

/// Files probed, in order, when no explicit path is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["dmviz.yaml", "dmviz.yml", "dmviz.toml"];

/// Configuration loader for the application.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML or TOML file with environment overrides.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
        Self::load_config_with(path, |var| env::var(var).ok())
    }

    /// Load configuration from a file, resolving overrides through `lookup`.
    pub fn load_config_with<P, F>(path: P, lookup: F) -> Result<Config>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DmVizError::config_with_source(
                format!("Failed to read configuration file {}", path.display()),
                e,
            )
        })?;
        let mut config = Self::parse(path, &content)?;

        Self::apply_overrides(&mut config, lookup)?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration text, choosing the format by file extension.
    pub fn parse(path: &Path, content: &str) -> Result<Config> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("yaml" | "yml") | None => Ok(serde_yaml::from_str(content)?),
            Some(other) => Err(DmVizError::config(format!(
                "Unsupported configuration format '.{other}', expected .yaml, .yml or .toml"
            ))),
        }
    }

    /// Load configuration from environment variables and files.
    pub fn load() -> Result<Config> {
        Self::load_with(|var| env::var(var).ok())
    }

    /// Like [`ConfigLoader::load`] with an explicit variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(CONFIG_PATH_VAR) {
            return Self::load_config_with(path, lookup);
        }

        if let Some(path) = Self::find_default_file() {
            return Self::load_config_with(path, lookup);
        }

        debug!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_overrides(&mut config, lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn find_default_file() -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Apply `DMVIZ_*` overrides resolved through `lookup`.
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("DMVIZ_DATA_DIR") {
            config.data.base_dir = PathBuf::from(dir);
        }

        if let Some(url) = lookup("DMVIZ_BASE_URL") {
            config.data.base_url = Some(url).filter(|u| !u.trim().is_empty());
        }

        if let Some(top_n) = lookup("DMVIZ_TOP_N") {
            config.view.top_n = top_n.trim().parse().map_err(|e| {
                DmVizError::config_with_source(
                    format!("Failed to parse environment variable 'DMVIZ_TOP_N': {top_n}"),
                    e,
                )
            })?;
        }

        if let Some(level) = lookup("DMVIZ_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(tie_break) = lookup("DMVIZ_TIE_BREAK") {
            config.ranking.tie_break = tie_break.parse()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmviz_common::TieBreak;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let lookup = lookup_from(&[
            ("DMVIZ_DATA_DIR", "/srv/snapshots"),
            ("DMVIZ_TOP_N", " 25 "),
            ("DMVIZ_TIE_BREAK", "name"),
        ]);
        ConfigLoader::apply_overrides(&mut config, lookup).unwrap();

        assert_eq!(config.data.base_dir, PathBuf::from("/srv/snapshots"));
        assert_eq!(config.view.top_n, 25);
        assert_eq!(config.ranking.tie_break, TieBreak::Name);
        assert!(config.data.base_url.is_none());
    }

    #[test]
    fn test_invalid_top_n_override() {
        let mut config = Config::default();
        let err = ConfigLoader::apply_overrides(&mut config, lookup_from(&[("DMVIZ_TOP_N", "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains("DMVIZ_TOP_N"));
    }

    #[test]
    fn test_empty_base_url_override_clears() {
        let mut config = Config::default();
        config.data.base_url = Some("http://localhost:8000/".to_string());
        ConfigLoader::apply_overrides(&mut config, lookup_from(&[("DMVIZ_BASE_URL", "")]))
            .unwrap();
        assert!(config.data.base_url.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_extension() {
        let err = ConfigLoader::parse(Path::new("dmviz.ini"), "").unwrap_err();
        assert!(err.to_string().contains(".ini"));
    }
}
