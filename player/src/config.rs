use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use bili_api::{
    client::{API_BASE, LIVE_BASE, WEB_REFERER},
    ClientConfig,
};
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};

use crate::{errors::PlayerError, session::SessionOptions};

const APP_NAME: &str = "cn.aaa1115910.bv";
const CONFIG_FILE: &str = "Conf.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_live_base")]
    pub live_base: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub cookies: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_qn")]
    pub qn: i32,
    #[serde(default = "default_fnval")]
    pub fnval: i32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_base() -> String {
    API_BASE.to_string()
}

fn default_live_base() -> String {
    LIVE_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_referer() -> String {
    WEB_REFERER.to_string()
}

fn default_qn() -> i32 {
    80
}

fn default_fnval() -> i32 {
    4048
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            live_base: default_live_base(),
            user_agent: None,
            cookies: None,
            timeout_secs: default_timeout_secs(),
            referer: default_referer(),
            qn: default_qn(),
            fnval: default_fnval(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// `<config_dir>/cn.aaa1115910.bv/Conf.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        AppDirs::new(Some(APP_NAME), false).map(|dirs| dirs.config_dir.join(CONFIG_FILE))
    }

    /// Missing or broken files fall back to the defaults.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::info!("Config {} not loaded: {}", path.display(), e);
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Config {} is invalid, using defaults: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PlayerError> {
        let content = toml::to_string(self).map_err(|e| PlayerError::ConfigError {
            err: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base: self.api_base.clone(),
            live_base: self.live_base.clone(),
            user_agent: self.user_agent.clone(),
            cookies: self.cookies.clone(),
            referer: self.referer.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            qn: self.qn,
            fnval: self.fnval,
            ..Default::default()
        }
    }

    /// Unknown levels are treated as `info`.
    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("Conf.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.client_config().timeout, Duration::from_secs(10));
        assert_eq!(config.session_options(), SessionOptions::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Conf.toml");
        std::fs::write(&path, "qn = 64\ncookies = \"SESSDATA=abc\"\nlog_level = \"debug\"\n")
            .unwrap();

        let config = Config::load(&path);
        assert_eq!(config.qn, 64);
        assert_eq!(config.fnval, 4048);
        assert_eq!(config.cookies.as_deref(), Some("SESSDATA=abc"));
        assert_eq!(config.referer, "https://www.bilibili.com");
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
        assert_eq!(config.session_options().qn, 64);
    }

    #[test]
    fn invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Conf.toml");
        std::fs::write(&path, "qn = \"high\"").unwrap();
        assert_eq!(Config::load(&path), Config::default());
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("Conf.toml");
        let config = Config {
            user_agent: Some("bv-test".to_string()),
            timeout_secs: 3,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path), config);
    }

    #[test]
    fn unknown_log_level_is_info() {
        let config = Config {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }
}
