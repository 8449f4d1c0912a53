use super::*;

impl<S: KeyValueStore> App<S> {
    /// Probes the backend once so the top bar can show whether it is reachable.
    pub fn init(&mut self) {
        let Some(api) = self.api.clone() else {
            self.backend_status = BackendStatus::Offline;
            return;
        };
        self.spawn_app_task(async move {
            AppAsyncEvent::HealthChecked {
                result: api.health().await,
            }
        });
    }

    pub(super) fn submit_path(&mut self) {
        self.focus = Focus::Viewer;
        let Some(raw) = self.path_input.take_path() else {
            self.picker.close();
            return;
        };
        if let Some(path) = self.picker.choose(PathBuf::from(raw)) {
            self.start_upload(path);
        }
    }

    pub(super) fn start_upload(&mut self, path: PathBuf) {
        let file = match PdfFile::from_path(&path) {
            Ok(file) => file,
            Err(e) => {
                self.report_error(&format!("Cannot read {}", path.display()), e);
                return;
            }
        };

        let ticket = match self.upload.select_file(file) {
            Ok(ticket) => ticket,
            Err(UploadRejection::Busy) => return,
            Err(rejection) => {
                tracing::info!(path = %path.display(), "Rejected file: {rejection}");
                return;
            }
        };

        self.pending_explanations.clear();
        self.doc_info = None;
        let Some(api) = self.api.clone() else {
            self.upload.complete(
                ticket.sequence,
                Err(ppt_helper_client::ApiError::Decode(
                    "backend URL is not configured".to_string(),
                )),
            );
            return;
        };

        self.spawn_app_task(async move {
            let result = match ticket.file.read_content().await {
                Ok(bytes) => api.upload_pdf(&ticket.file.name, bytes).await,
                Err(e) => Err(e.into()),
            };
            AppAsyncEvent::UploadFinished {
                sequence: ticket.sequence,
                result,
            }
        });
    }

    fn request_info(&mut self) {
        let (Some(pdf_id), Some(api)) = (self.upload.pdf_id(), self.api.clone()) else {
            return;
        };
        let pdf_id = pdf_id.to_string();
        self.spawn_app_task(async move {
            let result = api.pdf_info(&pdf_id).await;
            AppAsyncEvent::InfoLoaded { pdf_id, result }
        });
    }

    /// Fetches the explanation for the current page unless it is cached or
    /// already on its way.
    pub(super) fn request_explanation(&mut self) {
        let (Some(pdf_id), Some(page)) = (self.upload.pdf_id(), self.upload.current_page()) else {
            return;
        };
        if self.upload.explanation(page).is_some() || self.pending_explanations.contains(&page) {
            return;
        }
        let Some(api) = self.api.clone() else {
            return;
        };

        let pdf_id = pdf_id.to_string();
        let credentials = self.settings.settings().credentials();
        self.pending_explanations.insert(page);
        tracing::debug!(%pdf_id, page, model = %credentials.model, "Requesting explanation");

        self.spawn_app_task(async move {
            let result = api.explain_page(&pdf_id, page, &credentials).await;
            AppAsyncEvent::ExplanationLoaded {
                pdf_id,
                page,
                result,
            }
        });
    }

    pub(super) fn save_settings(&mut self) {
        match self.editor.save(&mut self.settings) {
            Ok(outcome) => {
                self.notice = outcome.warning;
                self.focus = Focus::Viewer;
                self.clear_error();
                tracing::info!(
                    using_default = self.settings.is_using_default(),
                    model = %self.settings.model(),
                    "Settings saved"
                );
            }
            Err(e) => {
                self.editor.set_error("Could not save settings");
                self.report_error("Failed to save settings", e);
            }
        }
    }

    pub(super) fn clear_settings(&mut self) {
        if let Err(e) = self.editor.clear(&mut self.settings) {
            self.report_error("Failed to clear settings", e);
        } else {
            self.notice = Some("Settings cleared".to_string());
        }
    }

    pub(super) fn close_document(&mut self) {
        if self.upload.is_uploading() {
            return;
        }
        self.upload.reset();
        self.pending_explanations.clear();
        self.doc_info = None;
        self.notice = None;
    }

    pub fn process_async_events(&mut self) {
        let mut async_events = Vec::new();
        if let Some(ref mut rx) = self.app_async_rx {
            while let Ok(event) = rx.try_recv() {
                async_events.push(event);
            }
        }

        for event in async_events {
            match event {
                AppAsyncEvent::UploadFinished { sequence, result } => {
                    if let Err(ref e) = result {
                        tracing::warn!("Upload failed: {}", redact_secrets(&e.to_string()));
                    }
                    if self.upload.complete(sequence, result)
                        && self.upload.status() == UploadStatus::Ready
                    {
                        self.clear_error();
                        self.request_explanation();
                        self.request_info();
                    }
                }
                AppAsyncEvent::ExplanationLoaded {
                    pdf_id,
                    page,
                    result,
                } => {
                    if self.upload.pdf_id() != Some(pdf_id.as_str()) {
                        continue;
                    }
                    self.pending_explanations.remove(&page);
                    match result {
                        Ok(explanation) => {
                            self.upload.cache_explanation(&pdf_id, explanation);
                        }
                        Err(e) => self.report_error(&format!("Failed to explain page {page}"), e),
                    }
                }
                AppAsyncEvent::InfoLoaded { pdf_id, result } => {
                    if self.upload.pdf_id() != Some(pdf_id.as_str()) {
                        continue;
                    }
                    match result {
                        Ok(info) => self.doc_info = Some(info),
                        // Only decorates the viewer, so the error line stays free.
                        Err(e) => tracing::debug!(%pdf_id, "No document info: {e}"),
                    }
                }
                AppAsyncEvent::HealthChecked { result } => {
                    self.backend_status = match result {
                        Ok(health) if health.is_healthy() => BackendStatus::Online {
                            version: health.version,
                        },
                        Ok(health) => {
                            tracing::warn!(status = %health.status, "Backend reports unhealthy");
                            BackendStatus::Offline
                        }
                        Err(e) => {
                            tracing::warn!("Backend health check failed: {e}");
                            BackendStatus::Offline
                        }
                    };
                }
            }
        }
    }
}
