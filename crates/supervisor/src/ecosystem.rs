use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EcosystemError {
    #[error("Failed to read ecosystem file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Could not encode TOML: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid ecosystem: {0}")]
    Invalid(String),
}

fn default_true() -> bool {
    true
}

fn default_max_restarts() -> u32 {
    10
}

fn default_restart_delay() -> u64 {
    5000
}

fn default_min_uptime() -> u64 {
    1000
}

/// One long-running process the supervisor keeps alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    pub name: String,
    pub cwd: PathBuf,
    pub script: String,
    #[serde(default)]
    pub args: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(default = "default_true")]
    pub autorestart: bool,
    #[serde(default)]
    pub watch: bool,
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,
    /// Milliseconds.
    #[serde(default = "default_restart_delay")]
    pub restart_delay: u64,
    /// Milliseconds. A run that lasts at least this long resets the restart count.
    #[serde(default = "default_min_uptime")]
    pub min_uptime: u64,
}

impl WorkUnit {
    pub fn arg_list(&self) -> Vec<String> {
        self.args.split_whitespace().map(str::to_string).collect()
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay)
    }

    pub fn min_uptime(&self) -> Duration {
        Duration::from_millis(self.min_uptime)
    }

    /// `interpreter = "none"` means the script is executed directly.
    pub fn program_and_args(&self) -> (String, Vec<String>) {
        match self.interpreter.as_deref() {
            None | Some("none") | Some("") => (self.script.clone(), self.arg_list()),
            Some(interp) => {
                let mut args = vec![self.script.clone()];
                args.extend(self.arg_list());
                (interp.to_string(), args)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ecosystem {
    #[serde(default)]
    pub apps: Vec<WorkUnit>,
}

impl Ecosystem {
    /// Reads `.json` files as JSON and everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, EcosystemError> {
        let content = std::fs::read_to_string(path)?;
        let ecosystem: Ecosystem = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };
        ecosystem.validate()?;
        Ok(ecosystem)
    }

    pub fn validate(&self) -> Result<(), EcosystemError> {
        if self.apps.is_empty() {
            return Err(EcosystemError::Invalid("no apps defined".to_string()));
        }
        let mut seen = HashSet::new();
        for unit in &self.apps {
            if unit.name.trim().is_empty() {
                return Err(EcosystemError::Invalid("app with empty name".to_string()));
            }
            if unit.script.trim().is_empty() {
                return Err(EcosystemError::Invalid(format!(
                    "app '{}' has no script",
                    unit.name
                )));
            }
            if !seen.insert(unit.name.as_str()) {
                return Err(EcosystemError::Invalid(format!(
                    "duplicate app name '{}'",
                    unit.name
                )));
            }
        }
        Ok(())
    }

    /// Backend API server plus frontend dev server. Paths are placeholders.
    pub fn template() -> Self {
        Self {
            apps: vec![
                WorkUnit {
                    name: "ppt-backend".to_string(),
                    cwd: PathBuf::from("/path/to/ppt_helper/backend"),
                    script: "/path/to/miniconda3/envs/ppt_helper/bin/uvicorn".to_string(),
                    args: "app.main:app --host 127.0.0.1 --port 8000".to_string(),
                    interpreter: Some("none".to_string()),
                    autorestart: true,
                    watch: false,
                    max_restarts: 10,
                    restart_delay: 5000,
                    min_uptime: 1000,
                },
                WorkUnit {
                    name: "ppt-frontend".to_string(),
                    cwd: PathBuf::from("/path/to/ppt_helper/frontend"),
                    script: "npm".to_string(),
                    args: "run dev".to_string(),
                    interpreter: None,
                    autorestart: true,
                    watch: false,
                    max_restarts: 10,
                    restart_delay: 5000,
                    min_uptime: 1000,
                },
            ],
        }
    }

    pub fn to_toml_string(&self) -> Result<String, EcosystemError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes the template, refusing to clobber an existing file unless `force`.
    pub fn write_template(path: &Path, force: bool) -> Result<(), EcosystemError> {
        if path.exists() && !force {
            return Err(EcosystemError::Invalid(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut body = String::from(
            "# Copy this file, then edit cwd/script to match your checkout.\n\
             # Start with: ppt-helper supervise --ecosystem <this file>\n\n",
        );
        body.push_str(&Self::template().to_toml_string()?);
        std::fs::write(path, body)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&WorkUnit> {
        self.apps.iter().find(|u| u.name == name)
    }
}
