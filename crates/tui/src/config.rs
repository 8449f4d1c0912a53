use directories::ProjectDirs;
use ppt_helper_client::api::DEFAULT_BASE_URL;
use ppt_helper_client::Timeouts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BACKEND_URL_ENV: &str = "PPT_HELPER_BACKEND_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides the directory holding the persisted settings.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    pub ecosystem_path: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 120,
            connect_timeout_seconds: 5,
        }
    }
}

impl BackendConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connect_timeout_seconds),
            request: Duration::from_secs(self.timeout_seconds),
        }
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "ppt-helper", "ppt-helper")
}

pub fn default_config_path() -> PathBuf {
    if let Some(proj_dirs) = project_dirs() {
        proj_dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("config/default.toml")
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), "Ignoring invalid config: {e}");
                }
                Self::default()
            }
        }
    }

    /// Environment wins over the file.
    pub fn apply_env(&mut self) {
        self.apply_backend_override(std::env::var(BACKEND_URL_ENV).ok());
    }

    fn apply_backend_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.backend.base_url = url.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_or_default(Path::new("/nonexistent/ppt-helper.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[backend]\nbase_url = \"http://10.0.0.2:9000\"\ntimeout_seconds = 30\nconnect_timeout_seconds = 2\n",
        )
        .expect("write");
        let config = Config::load_or_default(&path);
        assert_eq!(config.backend.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.backend.timeouts().request, Duration::from_secs(30));
        assert!(config.storage.dir.is_none());
    }

    #[test]
    fn invalid_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = 5").expect("write");
        assert_eq!(Config::load_or_default(&path), Config::default());
    }

    #[test]
    fn backend_override_ignores_blank_values() {
        let mut config = Config::default();
        config.apply_backend_override(Some("  ".to_string()));
        assert_eq!(config.backend.base_url, DEFAULT_BASE_URL);
        config.apply_backend_override(Some(" http://api:8000 ".to_string()));
        assert_eq!(config.backend.base_url, "http://api:8000");
    }
}
