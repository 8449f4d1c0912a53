use ppt_helper_client::{ApiError, HealthStatus, PageExplanation, PdfInfo, UploadResponse};

/// Results of background work, drained on the UI thread each tick.
pub enum AppAsyncEvent {
    UploadFinished {
        sequence: u64,
        result: Result<UploadResponse, ApiError>,
    },
    ExplanationLoaded {
        pdf_id: String,
        page: u32,
        result: Result<PageExplanation, ApiError>,
    },
    InfoLoaded {
        pdf_id: String,
        result: Result<PdfInfo, ApiError>,
    },
    HealthChecked {
        result: Result<HealthStatus, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Unknown,
    Online {
        version: Option<String>,
    },
    Offline,
}

/// Which overlay, if any, owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Viewer,
    PathPrompt,
    PageJump,
    Settings,
}
