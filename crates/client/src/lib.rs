pub mod api;
pub mod error;
pub mod settings;
pub mod storage;
pub mod types;

pub use api::{BackendApi, Timeouts};
pub use error::{redact_secrets, ApiError, ApiResult, StoreError};
pub use settings::{looks_like_api_key, ModelId, Settings, SettingsStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::*;
