use ppt_helper_client::{looks_like_api_key, KeyValueStore, ModelId, SettingsStore, StoreError};
use thiserror::Error;

pub const KEY_FORMAT_WARNING: &str = "The API key format may be incorrect, please double-check it";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditorRejection {
    #[error("{0} requires your own API key")]
    RestrictedModel(ModelId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    ApiKey,
    Model,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Advisory only; the save went through regardless.
    pub warning: Option<String>,
}

/// Staged edits for the settings modal. Nothing reaches the store until `save`.
#[derive(Debug)]
pub struct SettingsEditor {
    open: bool,
    staged_key: String,
    staged_model: ModelId,
    show_key: bool,
    error: Option<String>,
    field: EditorField,
}

impl Default for SettingsEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsEditor {
    pub fn new() -> Self {
        Self {
            open: false,
            staged_key: String::new(),
            staged_model: ModelId::default(),
            show_key: false,
            error: None,
            field: EditorField::ApiKey,
        }
    }

    pub fn open<S: KeyValueStore>(&mut self, store: &SettingsStore<S>) {
        self.staged_key = store.api_key().to_string();
        self.staged_model = store.model();
        self.show_key = false;
        self.error = None;
        self.field = EditorField::ApiKey;
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn staged_key(&self) -> &str {
        &self.staged_key
    }

    pub fn staged_model(&self) -> ModelId {
        self.staged_model
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn field(&self) -> EditorField {
        self.field
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            EditorField::ApiKey => EditorField::Model,
            EditorField::Model => EditorField::ApiKey,
        };
    }

    pub fn is_key_visible(&self) -> bool {
        self.show_key
    }

    pub fn toggle_key_visibility(&mut self) {
        self.show_key = !self.show_key;
    }

    pub fn key_display(&self) -> String {
        if self.show_key {
            self.staged_key.clone()
        } else {
            "*".repeat(self.staged_key.chars().count())
        }
    }

    pub fn set_key_input(&mut self, value: impl Into<String>) {
        self.staged_key = value.into();
        self.error = None;
        if self.staged_key.trim().is_empty() && self.staged_model.is_restricted() {
            self.staged_model = ModelId::default();
        }
    }

    pub fn input_char(&mut self, c: char) {
        let mut key = std::mem::take(&mut self.staged_key);
        key.push(c);
        self.set_key_input(key);
    }

    pub fn backspace(&mut self) {
        let mut key = std::mem::take(&mut self.staged_key);
        key.pop();
        self.set_key_input(key);
    }

    /// Restricted models are disabled while the staged key is blank.
    pub fn is_model_enabled(&self, model: ModelId) -> bool {
        !model.is_restricted() || !self.staged_key.trim().is_empty()
    }

    pub fn select_model(&mut self, model: ModelId) -> Result<(), EditorRejection> {
        if !self.is_model_enabled(model) {
            return Err(EditorRejection::RestrictedModel(model));
        }
        self.staged_model = model;
        Ok(())
    }

    /// Moves the model cursor, skipping disabled entries.
    pub fn cycle_model(&mut self, forward: bool) {
        let all = ModelId::ALL;
        let start = all
            .iter()
            .position(|m| *m == self.staged_model)
            .unwrap_or(0);
        for step in 1..=all.len() {
            let idx = if forward {
                (start + step) % all.len()
            } else {
                (start + all.len() * step - step) % all.len()
            };
            if self.select_model(all[idx]).is_ok() {
                return;
            }
        }
    }

    /// Commits staged values and closes. A malformed key only yields a warning.
    pub fn save<S: KeyValueStore>(
        &mut self,
        store: &mut SettingsStore<S>,
    ) -> Result<SaveOutcome, StoreError> {
        let trimmed = self.staged_key.trim().to_string();
        let warning = (!trimmed.is_empty() && !looks_like_api_key(&trimmed))
            .then(|| KEY_FORMAT_WARNING.to_string());

        store.commit(&trimmed, self.staged_model)?;
        self.error = None;
        self.open = false;
        Ok(SaveOutcome { warning })
    }

    /// Resets the store and the staged values; the modal stays open.
    pub fn clear<S: KeyValueStore>(&mut self, store: &mut SettingsStore<S>) -> Result<(), StoreError> {
        let result = store.clear_settings();
        self.staged_key.clear();
        self.staged_model = ModelId::default();
        self.error = None;
        result
    }

    pub fn cancel(&mut self) {
        self.open = false;
        self.error = None;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppt_helper_client::MemoryStore;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    fn store() -> SettingsStore<MemoryStore> {
        SettingsStore::load(MemoryStore::new())
    }

    #[test]
    fn open_copies_current_store_values() {
        let mut store = store();
        store.set_api_key("AIzaKey").expect("key");
        store.set_model(ModelId::Gemini25Pro).expect("model");

        let mut editor = SettingsEditor::new();
        editor.open(&store);
        assert!(editor.is_open());
        assert_eq!(editor.staged_key(), "AIzaKey");
        assert_eq!(editor.staged_model(), ModelId::Gemini25Pro);
    }

    #[test]
    fn restricted_model_is_rejected_without_key() {
        let store = store();
        let mut editor = SettingsEditor::new();
        editor.open(&store);

        assert!(!editor.is_model_enabled(ModelId::Gemini25Pro));
        assert_eq!(
            editor.select_model(ModelId::Gemini25Pro),
            Err(EditorRejection::RestrictedModel(ModelId::Gemini25Pro))
        );
        assert_eq!(editor.staged_model(), ModelId::Gemini25Flash);
        assert_eq!(store.model(), ModelId::Gemini25Flash);
    }

    #[test]
    fn whitespace_key_does_not_unlock_restricted_model() {
        let mut editor = SettingsEditor::new();
        editor.open(&store());
        editor.set_key_input("   ");
        assert!(editor.select_model(ModelId::Gemini25Pro).is_err());
    }

    #[test]
    fn cancel_leaves_store_untouched() {
        let store = store();
        let mut editor = SettingsEditor::new();
        editor.open(&store);
        editor.set_key_input("AIzaNew");
        editor.select_model(ModelId::Gemini25Pro).expect("enabled");
        editor.cancel();

        assert!(!editor.is_open());
        assert_eq!(store.api_key(), "");
        assert_eq!(store.model(), ModelId::Gemini25Flash);

        let mut editor2 = SettingsEditor::new();
        editor2.open(&store);
        assert_eq!(editor2.staged_key(), "");
    }

    #[test]
    fn save_commits_key_and_model() {
        let mut store = store();
        let mut editor = SettingsEditor::new();
        editor.open(&store);
        editor.set_key_input("  AIzaKey  ");
        editor.select_model(ModelId::Gemini25Pro).expect("enabled");

        let outcome = editor.save(&mut store).expect("saved");
        assert_eq!(outcome.warning, None);
        assert!(!editor.is_open());
        assert_eq!(store.api_key(), "AIzaKey");
        assert_eq!(store.model(), ModelId::Gemini25Pro);
    }

    #[test]
    fn failed_write_still_applies_key_and_model_together() {
        let mut store = SettingsStore::load(FailingStore);
        let mut editor = SettingsEditor::new();
        editor.open(&store);
        editor.set_key_input("AIzaKey");
        editor.select_model(ModelId::Gemini25Pro).expect("enabled");

        assert!(editor.save(&mut store).is_err());
        assert!(editor.is_open());
        assert_eq!(store.api_key(), "AIzaKey");
        assert_eq!(store.model(), ModelId::Gemini25Pro);
        assert!(!store.is_using_default());
    }

    #[test]
    fn malformed_key_warns_but_still_saves() {
        let mut store = store();
        let mut editor = SettingsEditor::new();
        editor.open(&store);
        editor.set_key_input("my-custom-key");

        let outcome = editor.save(&mut store).expect("saved");
        assert_eq!(outcome.warning.as_deref(), Some(KEY_FORMAT_WARNING));
        assert_eq!(store.api_key(), "my-custom-key");
        assert!(!store.is_using_default());
    }

    #[test]
    fn saving_blank_key_restores_default_model() {
        let mut store = store();
        store.set_api_key("sk-old").expect("key");
        store.set_model(ModelId::Gemini25Pro).expect("model");

        let mut editor = SettingsEditor::new();
        editor.open(&store);
        editor.set_key_input("");
        assert_eq!(editor.staged_model(), ModelId::Gemini25Flash);

        let outcome = editor.save(&mut store).expect("saved");
        assert_eq!(outcome, SaveOutcome::default());
        assert!(store.is_using_default());
        assert_eq!(store.model(), ModelId::Gemini25Flash);
    }

    #[test]
    fn clear_resets_store_and_stage_but_stays_open() {
        let mut store = store();
        store.set_api_key("sk-old").expect("key");
        store.set_model(ModelId::Gemini25Pro).expect("model");

        let mut editor = SettingsEditor::new();
        editor.open(&store);
        editor.set_error("stale");
        editor.clear(&mut store).expect("cleared");

        assert!(editor.is_open());
        assert_eq!(editor.staged_key(), "");
        assert_eq!(editor.staged_model(), ModelId::Gemini25Flash);
        assert!(editor.error().is_none());
        assert!(store.is_using_default());
    }

    #[test]
    fn typing_clears_validation_error() {
        let mut editor = SettingsEditor::new();
        editor.open(&store());
        editor.set_error("bad");
        editor.input_char('s');
        assert!(editor.error().is_none());
        assert_eq!(editor.staged_key(), "s");
        editor.backspace();
        assert_eq!(editor.staged_key(), "");
    }

    #[test]
    fn cycle_skips_disabled_models() {
        let mut editor = SettingsEditor::new();
        editor.open(&store());
        editor.cycle_model(true);
        assert_eq!(editor.staged_model(), ModelId::Gemini25Flash);

        editor.set_key_input("AIza1");
        editor.cycle_model(true);
        assert_eq!(editor.staged_model(), ModelId::Gemini25Pro);
        editor.cycle_model(false);
        assert_eq!(editor.staged_model(), ModelId::Gemini25Flash);
    }

    #[test]
    fn key_is_masked_until_revealed() {
        let mut editor = SettingsEditor::new();
        editor.open(&store());
        editor.set_key_input("AIza");
        assert_eq!(editor.key_display(), "****");
        editor.toggle_key_visibility();
        assert_eq!(editor.key_display(), "AIza");
    }
}
