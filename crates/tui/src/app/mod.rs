use crate::input::InputState;
use crate::keybinds::Keybinds;
use crate::settings_editor::{EditorField, SettingsEditor};
use crate::ui::layout::LayoutState;
use crate::ui::panel::PanelType;
use crate::upload::{FilePicker, PdfFile, UploadController, UploadRejection, UploadStatus};
use crate::Config;
use anyhow::Result;
use ppt_helper_client::{
    redact_secrets, BackendApi, KeyValueStore, ModelId, PdfInfo, SettingsStore,
};
use ratatui::crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::mpsc;

mod effects;
mod input;
mod render;
mod state;
mod types;

pub use state::App;
pub use types::{AppAsyncEvent, BackendStatus, Focus};

impl<S: KeyValueStore> App<S> {
    pub(super) fn report_error(&mut self, context: &str, error: impl std::fmt::Display) {
        let message = format!("{context}: {}", redact_secrets(&error.to_string()));
        self.last_error = Some(message.clone());
        tracing::warn!("{message}");
    }

    pub(super) fn clear_error(&mut self) {
        self.last_error = None;
        self.show_error_details = false;
    }

    pub(super) fn spawn_app_task<F>(&self, future: F)
    where
        F: Future<Output = AppAsyncEvent> + Send + 'static,
    {
        if let Some(tx) = self.app_async_tx.clone() {
            tokio::spawn(async move {
                let event = future.await;
                let _ = tx.send(event);
            });
        }
    }
}
