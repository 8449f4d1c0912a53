use crate::error::{redact_secrets, StoreError};
use crate::storage::KeyValueStore;
use crate::types::Credentials;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

pub const SETTINGS_NAMESPACE: &str = "unitutor-settings";

/// Key prefixes of the two supported providers. Anything else only earns a warning.
pub const KNOWN_KEY_PREFIXES: [&str; 2] = ["AI", "sk-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
}

impl ModelId {
    pub const ALL: [ModelId; 2] = [ModelId::Gemini25Flash, ModelId::Gemini25Pro];

    pub fn id(self) -> &'static str {
        match self {
            ModelId::Gemini25Flash => "gemini-2.5-flash",
            ModelId::Gemini25Pro => "gemini-2.5-pro",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelId::Gemini25Flash => "Gemini 2.5 Flash",
            ModelId::Gemini25Pro => "Gemini 2.5 Pro",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ModelId::Gemini25Flash => "Fast responses, good for everyday use",
            ModelId::Gemini25Pro => "More capable, suited to dense material",
        }
    }

    /// Restricted models need a user-supplied API key.
    pub fn is_restricted(self) -> bool {
        matches!(self, ModelId::Gemini25Pro)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown model id: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for ModelId {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}

pub fn looks_like_api_key(key: &str) -> bool {
    KNOWN_KEY_PREFIXES.iter().any(|p| key.starts_with(p))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub api_key: String,
    pub model: ModelId,
}

impl Settings {
    pub fn is_using_default(&self) -> bool {
        self.api_key.is_empty()
    }

    /// There is always a usable configuration, the default one included.
    pub fn is_configured(&self) -> bool {
        true
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            api_key: (!self.is_using_default()).then(|| self.api_key.clone()),
            model: self.model.id().to_string(),
        }
    }
}

/// On-disk shape. The derived flags are written for readers that expect them
/// but are recomputed on load.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSettings {
    api_key: String,
    model: ModelId,
    #[serde(default)]
    is_using_default: bool,
    #[serde(default)]
    is_configured: bool,
}

impl From<&Settings> for PersistedSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            model: settings.model,
            is_using_default: settings.is_using_default(),
            is_configured: settings.is_configured(),
        }
    }
}

/// Owns the process-wide settings and writes every mutation through to storage.
pub struct SettingsStore<S: KeyValueStore> {
    settings: Settings,
    storage: S,
}

impl<S: KeyValueStore> SettingsStore<S> {
    pub fn load(storage: S) -> Self {
        let settings = match storage.get(SETTINGS_NAMESPACE) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedSettings>(&raw) {
                Ok(persisted) => Self::normalize(persisted),
                Err(e) => {
                    warn!("Discarding unreadable settings record: {e}");
                    Settings::default()
                }
            },
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("Failed to read settings, using defaults: {e}");
                Settings::default()
            }
        };
        debug!(
            using_default = settings.is_using_default(),
            model = %settings.model,
            "Settings loaded"
        );
        Self { settings, storage }
    }

    fn normalize(persisted: PersistedSettings) -> Settings {
        let api_key = persisted.api_key.trim().to_string();
        let model = if api_key.is_empty() {
            ModelId::default()
        } else {
            persisted.model
        };
        Settings { api_key, model }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn api_key(&self) -> &str {
        &self.settings.api_key
    }

    pub fn model(&self) -> ModelId {
        self.settings.model
    }

    pub fn is_using_default(&self) -> bool {
        self.settings.is_using_default()
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Trims `key`. An empty result switches back to the default
    /// configuration and forces the default model.
    pub fn set_api_key(&mut self, key: &str) -> Result<(), StoreError> {
        let trimmed = key.trim();
        self.settings.api_key = trimmed.to_string();
        if trimmed.is_empty() {
            self.settings.model = ModelId::default();
        }
        self.persist()
    }

    /// Callers must not pass a restricted model while no key is set; the
    /// settings editor enforces this.
    pub fn set_model(&mut self, model: ModelId) -> Result<(), StoreError> {
        self.settings.model = model;
        self.persist()
    }

    /// Applies key and model together with a single write. Both values are in
    /// memory even when the write fails. A blank key still forces the default model.
    pub fn commit(&mut self, key: &str, model: ModelId) -> Result<(), StoreError> {
        let trimmed = key.trim();
        self.settings.api_key = trimmed.to_string();
        self.settings.model = if trimmed.is_empty() {
            ModelId::default()
        } else {
            model
        };
        self.persist()
    }

    pub fn clear_settings(&mut self) -> Result<(), StoreError> {
        self.settings = Settings::default();
        self.persist()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let record = serde_json::to_string(&PersistedSettings::from(&self.settings))?;
        if let Err(e) = self.storage.set(SETTINGS_NAMESPACE, &record) {
            warn!("Failed to persist settings: {}", redact_secrets(&e.to_string()));
            return Err(e);
        }
        Ok(())
    }
}
