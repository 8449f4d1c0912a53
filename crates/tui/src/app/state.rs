use super::*;
use std::collections::HashSet;

pub struct App<S: KeyValueStore> {
    pub should_quit: bool,
    pub config: Config,
    pub layout: LayoutState,
    pub keybinds: Keybinds,
    pub focus: Focus,
    pub path_input: InputState,
    pub page_input: InputState,
    pub picker: FilePicker,
    pub upload: UploadController,
    pub settings: SettingsStore<S>,
    pub editor: SettingsEditor,
    pub api: Option<BackendApi>,
    pub backend_status: BackendStatus,
    /// Pages with an explanation request in flight for the current document.
    pub pending_explanations: HashSet<u32>,
    /// Server-side record of the loaded document, fetched after upload.
    pub doc_info: Option<PdfInfo>,
    pub notice: Option<String>,
    pub dragging_divider: bool,
    pub last_mouse_pos: (u16, u16),
    pub app_async_tx: Option<mpsc::UnboundedSender<AppAsyncEvent>>,
    pub app_async_rx: Option<mpsc::UnboundedReceiver<AppAsyncEvent>>,
    pub show_help: bool,
    pub last_error: Option<String>,
    pub show_error_details: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(config: Config, storage: S) -> Self {
        let (app_async_tx, app_async_rx) = mpsc::unbounded_channel();

        let api = match BackendApi::new(&config.backend.base_url, config.backend.timeouts()) {
            Ok(api) => Some(api),
            Err(e) => {
                tracing::error!(url = %config.backend.base_url, "Invalid backend URL: {e}");
                None
            }
        };

        let mut app = Self {
            should_quit: false,
            config,
            layout: LayoutState::default(),
            keybinds: Keybinds,
            focus: Focus::Viewer,
            path_input: InputState::new(),
            page_input: InputState::new(),
            picker: FilePicker::default(),
            upload: UploadController::new(),
            settings: SettingsStore::load(storage),
            editor: SettingsEditor::new(),
            api,
            backend_status: BackendStatus::Unknown,
            pending_explanations: HashSet::new(),
            doc_info: None,
            notice: None,
            dragging_divider: false,
            last_mouse_pos: (0, 0),
            app_async_tx: Some(app_async_tx),
            app_async_rx: Some(app_async_rx),
            show_help: false,
            last_error: None,
            show_error_details: false,
        };

        if app.api.is_none() {
            let url = app.config.backend.base_url.clone();
            app.report_error("Invalid backend URL", url);
        }
        app
    }
}
