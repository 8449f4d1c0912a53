//! Upload session state, kept free of any rendering so transitions can be
//! exercised directly.

use ppt_helper_client::{ApiError, PageExplanation, UploadResponse};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const ACCEPTED_MIME_TYPE: &str = "application/pdf";
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Where the bytes of a selected document live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfSource {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// Selected document. The controller is its only owner once accepted.
///
/// Files picked from disk are described by their metadata only; the bytes
/// are read by the upload task after validation has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub source: PdfSource,
}

impl PdfFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: content.len() as u64,
            source: PdfSource::Memory(content.into()),
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        Ok(Self {
            name,
            mime_type: mime_type_for(path).to_string(),
            size: metadata.len(),
            source: PdfSource::Disk(path.to_path_buf()),
        })
    }

    pub async fn read_content(&self) -> std::io::Result<Vec<u8>> {
        match self.source {
            PdfSource::Memory(ref bytes) => Ok(bytes.to_vec()),
            PdfSource::Disk(ref path) => {
                let bytes = tokio::fs::read(path).await?;
                // The file may have grown since it was validated.
                if bytes.len() as u64 > MAX_UPLOAD_BYTES {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "file grew past the upload limit",
                    ));
                }
                Ok(bytes)
            }
        }
    }
}

/// Extension-based type detection, the same signal a browser file input reports.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => ACCEPTED_MIME_TYPE,
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Please choose a PDF file")]
    WrongType { mime_type: String },

    #[error("File size cannot exceed 50MB")]
    TooLarge { size: u64 },

    #[error("An upload is already in progress")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Ready,
    Error,
}

/// Handed out when a file is accepted. Completions must present it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub sequence: u64,
    pub file: PdfFile,
}

#[derive(Debug, Default)]
pub struct UploadController {
    status: UploadStatus,
    in_progress: bool,
    error: Option<String>,
    file: Option<PdfFile>,
    pdf_id: Option<String>,
    total_pages: Option<u32>,
    filename: Option<String>,
    current_page: Option<u32>,
    explanations: HashMap<u32, PageExplanation>,
    sequence: u64,
}

impl UploadController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Gates the file-selection trigger; distinct from `status`.
    pub fn is_uploading(&self) -> bool {
        self.in_progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn file(&self) -> Option<&PdfFile> {
        self.file.as_ref()
    }

    pub fn pdf_id(&self) -> Option<&str> {
        self.pdf_id.as_deref()
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn current_page(&self) -> Option<u32> {
        self.current_page
    }

    pub fn is_loaded(&self) -> bool {
        self.pdf_id.is_some()
    }

    /// Type first, then size.
    pub fn validate(file: &PdfFile) -> Result<(), UploadRejection> {
        if file.mime_type != ACCEPTED_MIME_TYPE {
            return Err(UploadRejection::WrongType {
                mime_type: file.mime_type.clone(),
            });
        }
        if file.size > MAX_UPLOAD_BYTES {
            return Err(UploadRejection::TooLarge { size: file.size });
        }
        Ok(())
    }

    /// Validation failures only set the error message; the status and any
    /// loaded document are left as they were.
    pub fn select_file(&mut self, file: PdfFile) -> Result<UploadTicket, UploadRejection> {
        if self.in_progress {
            return Err(UploadRejection::Busy);
        }
        if let Err(rejection) = Self::validate(&file) {
            self.error = Some(rejection.to_string());
            return Err(rejection);
        }

        self.reset();
        self.file = Some(file.clone());
        self.error = None;
        self.status = UploadStatus::Uploading;
        self.in_progress = true;
        self.sequence += 1;

        Ok(UploadTicket {
            sequence: self.sequence,
            file,
        })
    }

    /// Applies the outcome of the upload call. Returns `false` when the ticket
    /// is stale and nothing changed.
    pub fn complete(
        &mut self,
        ticket_sequence: u64,
        result: Result<UploadResponse, ApiError>,
    ) -> bool {
        if ticket_sequence != self.sequence || self.status != UploadStatus::Uploading {
            tracing::debug!(ticket_sequence, current = self.sequence, "Ignoring stale upload result");
            return false;
        }

        match result {
            Ok(response) => {
                self.current_page = (response.total_pages > 0).then_some(1);
                self.pdf_id = Some(response.pdf_id);
                self.total_pages = Some(response.total_pages);
                self.filename = Some(response.filename);
                self.status = UploadStatus::Ready;
            }
            Err(e) => {
                self.error = Some(e.user_message());
                self.status = UploadStatus::Error;
            }
        }
        self.in_progress = false;
        true
    }

    /// Clears everything scoped to the current document.
    pub fn reset(&mut self) {
        self.status = UploadStatus::Idle;
        self.in_progress = false;
        self.error = None;
        self.file = None;
        self.pdf_id = None;
        self.total_pages = None;
        self.filename = None;
        self.current_page = None;
        self.explanations.clear();
    }

    pub fn can_go_prev(&self) -> bool {
        matches!(self.current_page, Some(p) if p > 1)
    }

    pub fn can_go_next(&self) -> bool {
        match (self.current_page, self.total_pages) {
            (Some(p), Some(total)) => p < total,
            _ => false,
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.can_go_prev() {
            return false;
        }
        self.current_page = self.current_page.map(|p| p - 1);
        true
    }

    pub fn next_page(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.current_page = self.current_page.map(|p| p + 1);
        true
    }

    /// Clamps into `[1, total_pages]`.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        let Some(total) = self.total_pages.filter(|t| *t > 0) else {
            return false;
        };
        let page = page.clamp(1, total);
        let changed = self.current_page != Some(page);
        self.current_page = Some(page);
        changed
    }

    pub fn cache_explanation(&mut self, pdf_id: &str, explanation: PageExplanation) -> bool {
        if self.pdf_id.as_deref() != Some(pdf_id) {
            return false;
        }
        self.explanations
            .insert(explanation.page_number, explanation);
        true
    }

    pub fn explanation(&self, page: u32) -> Option<&PageExplanation> {
        self.explanations.get(&page)
    }
}

/// Models a file input: reopening it forgets the previous value so choosing
/// the same file again still counts as a change.
#[derive(Debug, Default)]
pub struct FilePicker {
    value: Option<PathBuf>,
    open: bool,
}

impl FilePicker {
    pub fn open(&mut self) {
        self.value = None;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn value(&self) -> Option<&Path> {
        self.value.as_deref()
    }

    /// Returns the path when it counts as a change notification.
    pub fn choose(&mut self, path: PathBuf) -> Option<PathBuf> {
        self.open = false;
        if self.value.as_ref() == Some(&path) {
            return None;
        }
        self.value = Some(path.clone());
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppt_helper_client::{PageContent, PageType};

    fn pdf(size: usize) -> PdfFile {
        PdfFile::new("lecture.pdf", ACCEPTED_MIME_TYPE, vec![0u8; size])
    }

    fn response(id: &str, pages: u32) -> UploadResponse {
        UploadResponse {
            pdf_id: id.to_string(),
            total_pages: pages,
            filename: format!("{id}.pdf"),
            message: None,
        }
    }

    fn explanation(page: u32) -> PageExplanation {
        PageExplanation {
            page_number: page,
            page_type: PageType::Content,
            content: PageContent::default(),
            original_language: "en".to_string(),
        }
    }

    #[test]
    fn accepts_exactly_the_size_limit() {
        let at_limit = PdfFile {
            size: MAX_UPLOAD_BYTES,
            ..pdf(0)
        };
        assert!(UploadController::validate(&at_limit).is_ok());

        let over = PdfFile {
            size: MAX_UPLOAD_BYTES + 1,
            ..pdf(0)
        };
        assert_eq!(
            UploadController::validate(&over),
            Err(UploadRejection::TooLarge {
                size: MAX_UPLOAD_BYTES + 1
            })
        );
    }

    #[test]
    fn type_is_checked_before_size() {
        let file = PdfFile {
            mime_type: "image/png".to_string(),
            size: 60 * 1024 * 1024,
            ..pdf(0)
        };
        let mut controller = UploadController::new();
        let err = controller.select_file(file).expect_err("rejected");
        assert!(matches!(err, UploadRejection::WrongType { .. }));
        assert_eq!(controller.error(), Some("Please choose a PDF file"));
    }

    #[test]
    fn oversized_file_keeps_status_and_records_error() {
        let mut controller = UploadController::new();
        let file = PdfFile {
            size: 60 * 1024 * 1024,
            ..pdf(0)
        };
        assert!(controller.select_file(file).is_err());
        assert_eq!(controller.status(), UploadStatus::Idle);
        assert!(!controller.is_uploading());
        assert_eq!(controller.error(), Some("File size cannot exceed 50MB"));
        assert!(controller.file().is_none());
    }

    #[test]
    fn rejection_leaves_loaded_document_in_place() {
        let mut controller = UploadController::new();
        let ticket = controller.select_file(pdf(10)).expect("accepted");
        controller.complete(ticket.sequence, Ok(response("doc1", 5)));

        let bad = PdfFile {
            mime_type: "text/plain".to_string(),
            ..pdf(10)
        };
        assert!(controller.select_file(bad).is_err());
        assert_eq!(controller.status(), UploadStatus::Ready);
        assert_eq!(controller.pdf_id(), Some("doc1"));
        assert!(controller.error().is_some());
    }

    #[test]
    fn successful_upload_populates_metadata() {
        let mut controller = UploadController::new();
        let ticket = controller.select_file(pdf(10)).expect("accepted");
        assert_eq!(controller.status(), UploadStatus::Uploading);
        assert!(controller.is_uploading());

        assert!(controller.complete(ticket.sequence, Ok(response("doc1", 12))));
        assert_eq!(controller.status(), UploadStatus::Ready);
        assert!(!controller.is_uploading());
        assert_eq!(controller.pdf_id(), Some("doc1"));
        assert_eq!(controller.total_pages(), Some(12));
        assert_eq!(controller.filename(), Some("doc1.pdf"));
        assert_eq!(controller.current_page(), Some(1));
        assert!(controller.error().is_none());
    }

    #[test]
    fn failed_upload_prefers_server_detail() {
        let mut controller = UploadController::new();
        let ticket = controller.select_file(pdf(10)).expect("accepted");
        controller.complete(
            ticket.sequence,
            Err(ApiError::Server {
                status: 400,
                detail: Some("Only PDF files are supported".to_string()),
            }),
        );
        assert_eq!(controller.status(), UploadStatus::Error);
        assert!(!controller.is_uploading());
        assert_eq!(controller.error(), Some("Only PDF files are supported"));
        assert!(controller.pdf_id().is_none());
    }

    #[test]
    fn failed_upload_without_detail_uses_generic_message() {
        let mut controller = UploadController::new();
        let ticket = controller.select_file(pdf(10)).expect("accepted");
        controller.complete(ticket.sequence, Err(ApiError::Decode("eof".to_string())));
        assert_eq!(
            controller.error(),
            Some(ppt_helper_client::error::GENERIC_UPLOAD_FAILURE)
        );
    }

    #[test]
    fn reupload_clears_previous_document_before_request() {
        let mut controller = UploadController::new();
        let first = controller.select_file(pdf(10)).expect("accepted");
        controller.complete(first.sequence, Ok(response("doc1", 5)));
        controller.next_page();
        assert!(controller.cache_explanation("doc1", explanation(2)));

        let second = controller.select_file(pdf(20)).expect("accepted");
        assert_eq!(controller.status(), UploadStatus::Uploading);
        assert!(controller.pdf_id().is_none());
        assert!(controller.total_pages().is_none());
        assert!(controller.filename().is_none());
        assert!(controller.current_page().is_none());
        assert!(controller.explanation(2).is_none());
        assert_eq!(controller.file().map(|f| f.size), Some(20));

        controller.complete(second.sequence, Ok(response("doc2", 3)));
        assert_eq!(controller.pdf_id(), Some("doc2"));
    }

    #[test]
    fn selection_is_refused_while_uploading() {
        let mut controller = UploadController::new();
        controller.select_file(pdf(10)).expect("accepted");
        assert_eq!(controller.select_file(pdf(20)), Err(UploadRejection::Busy));
        assert!(controller.error().is_none());
        assert_eq!(controller.file().map(|f| f.size), Some(10));
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut controller = UploadController::new();
        let first = controller.select_file(pdf(10)).expect("accepted");
        controller.complete(first.sequence, Err(ApiError::Decode("x".to_string())));
        let second = controller.select_file(pdf(10)).expect("accepted");

        assert!(!controller.complete(first.sequence, Ok(response("old", 9))));
        assert!(controller.pdf_id().is_none());
        assert!(controller.is_uploading());

        assert!(controller.complete(second.sequence, Ok(response("new", 2))));
        assert_eq!(controller.pdf_id(), Some("new"));
    }

    #[test]
    fn page_navigation_stays_in_bounds() {
        let mut controller = UploadController::new();
        assert!(!controller.next_page());
        let ticket = controller.select_file(pdf(1)).expect("accepted");
        controller.complete(ticket.sequence, Ok(response("doc", 3)));

        assert!(!controller.prev_page());
        assert!(controller.next_page());
        assert!(controller.next_page());
        assert!(!controller.next_page());
        assert_eq!(controller.current_page(), Some(3));

        controller.go_to_page(99);
        assert_eq!(controller.current_page(), Some(3));
        controller.go_to_page(0);
        assert_eq!(controller.current_page(), Some(1));
    }

    #[test]
    fn explanations_for_other_documents_are_dropped() {
        let mut controller = UploadController::new();
        let ticket = controller.select_file(pdf(1)).expect("accepted");
        controller.complete(ticket.sequence, Ok(response("doc", 3)));
        assert!(!controller.cache_explanation("other", explanation(1)));
        assert!(controller.explanation(1).is_none());
    }

    #[test]
    fn picker_reopen_allows_same_file_again() {
        let mut picker = FilePicker::default();
        let path = PathBuf::from("/tmp/lecture.pdf");

        picker.open();
        assert_eq!(picker.choose(path.clone()), Some(path.clone()));
        assert_eq!(picker.choose(path.clone()), None);

        picker.open();
        assert!(picker.value().is_none());
        assert_eq!(picker.choose(path.clone()), Some(path));
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(mime_type_for(Path::new("a/Slides.PDF")), ACCEPTED_MIME_TYPE);
        assert_eq!(mime_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(mime_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn from_path_stats_then_reads_after_acceptance() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("week1.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").expect("write");

        let file = PdfFile::from_path(&path).expect("stat");
        assert_eq!(file.name, "week1.pdf");
        assert_eq!(file.size, 13);
        assert_eq!(file.mime_type, ACCEPTED_MIME_TYPE);
        assert_eq!(file.source, PdfSource::Disk(path.clone()));

        let mut controller = UploadController::new();
        let ticket = controller.select_file(file).expect("accepted");
        let bytes = ticket.file.read_content().await.expect("read");
        assert_eq!(bytes, b"%PDF-1.4 test");
    }

    #[test]
    fn oversized_file_is_rejected_from_its_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("huge.pdf");
        // Sparse, so nothing close to 50 MiB is written or read.
        std::fs::File::create(&path)
            .and_then(|f| f.set_len(MAX_UPLOAD_BYTES + 1))
            .expect("sparse file");

        let file = PdfFile::from_path(&path).expect("stat");
        assert_eq!(file.size, MAX_UPLOAD_BYTES + 1);

        let mut controller = UploadController::new();
        assert_eq!(
            controller.select_file(file),
            Err(UploadRejection::TooLarge {
                size: MAX_UPLOAD_BYTES + 1
            })
        );
        assert_eq!(controller.error(), Some("File size cannot exceed 50MB"));
        assert!(!controller.is_uploading());
    }

    #[test]
    fn directories_are_not_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(PdfFile::from_path(dir.path()).is_err());
    }
}
