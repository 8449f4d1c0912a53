use super::*;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

const LOCK_MARKER: &str = "🔒";

impl<S: KeyValueStore> App<S> {
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        self.layout.calculate_layout(area);
        let panels = self.layout.get_panels().to_vec();

        for panel in panels {
            match panel.panel_type {
                PanelType::Topbar => self.render_topbar(frame, panel.rect),
                PanelType::Viewer => self.render_viewer(frame, panel.rect),
                PanelType::Explanation => self.render_explanation(frame, panel.rect),
                PanelType::StatusBar => self.render_status_bar(frame, panel.rect),
            }
        }

        match self.focus {
            Focus::PathPrompt => self.render_path_prompt(frame, area),
            Focus::PageJump => self.render_page_jump(frame, area),
            Focus::Settings => self.render_settings(frame, area),
            Focus::Viewer => {}
        }

        if self.show_help {
            self.render_help(frame, area);
        }

        if self.show_error_details {
            self.render_error_details(frame, area);
        }
    }

    fn render_topbar(&self, frame: &mut Frame, area: Rect) {
        let backend = match &self.backend_status {
            BackendStatus::Unknown => "backend: … checking".to_string(),
            BackendStatus::Online { version: Some(v) } => format!("backend: ● online v{v}"),
            BackendStatus::Online { version: None } => "backend: ● online".to_string(),
            BackendStatus::Offline => "backend: ○ offline".to_string(),
        };
        let key_source = if self.settings.is_using_default() {
            "default key"
        } else {
            "own key"
        };

        let text = format!(
            " ppt-helper   {}   model: {} ({}){}   [s] settings   [?] help",
            backend,
            self.settings.model().display_name(),
            key_source,
            if self.last_error.is_some() {
                "   ⚠ error"
            } else {
                ""
            },
        );

        frame.render_widget(Paragraph::new(text).block(Block::default()), area);
    }

    fn render_viewer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Document ");

        let mut lines: Vec<Line> = Vec::new();
        match self.upload.status() {
            UploadStatus::Ready => {
                let filename = self.upload.filename().unwrap_or("document.pdf");
                let page = self.upload.current_page().unwrap_or(0);
                let total = self.upload.total_pages().unwrap_or(0);
                lines.push(Line::from(Span::styled(
                    filename.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                if let Some(ref info) = self.doc_info {
                    lines.push(Line::from(Span::styled(
                        format!("Uploaded {}", info.uploaded_at.format("%Y-%m-%d %H:%M UTC")),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(format!("Page {page} / {total}")));
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    nav_span("← prev", self.upload.can_go_prev()),
                    Span::raw("   "),
                    nav_span("next →", self.upload.can_go_next()),
                ]));
                lines.push(Line::from(""));
                lines.push(Line::from("[g] jump   [e] explain   [r] close"));
            }
            UploadStatus::Uploading => {
                let name = self.upload.file().map(|f| f.name.as_str()).unwrap_or("PDF");
                lines.push(Line::from(format!("Uploading {name}…")));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "[o] disabled while uploading",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            UploadStatus::Idle | UploadStatus::Error => {
                lines.push(Line::from("Upload lecture slides"));
                lines.push(Line::from(""));
                lines.push(Line::from("Press [o] to choose a PDF file"));
                lines.push(Line::from(Span::styled(
                    "PDF only, up to 50MB",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        if let Some(error) = self.upload.error() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )));
        }

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_explanation(&self, frame: &mut Frame, area: Rect) {
        let page = self.upload.current_page();
        let title = match page {
            Some(p) => format!(" Explanation - page {p} "),
            None => " Explanation ".to_string(),
        };

        let text = match page {
            None => "Upload a PDF to see page explanations.".to_string(),
            Some(p) => match self.upload.explanation(p) {
                Some(explanation) => explanation.to_display_lines().join("\n"),
                None if self.pending_explanations.contains(&p) => {
                    "Generating explanation…".to_string()
                }
                None => "Press [e] to explain this page.".to_string(),
            },
        };

        frame.render_widget(
            Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL).title(title))
                .wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = if let Some(ref error) = self.last_error {
            (
                format!("{error}   [E] details"),
                Style::default().fg(Color::Red),
            )
        } else if let Some(ref notice) = self.notice {
            (notice.clone(), Style::default().fg(Color::Yellow))
        } else {
            (
                format!("Backend: {}", self.config.backend.base_url),
                Style::default().fg(Color::DarkGray),
            )
        };

        frame.render_widget(
            Paragraph::new(text)
                .style(style)
                .block(Block::default().borders(Borders::ALL)),
            area,
        );
    }

    fn render_path_prompt(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 20, area);
        let text = format!(
            "Path to a PDF file:\n\n{}█\n\n[Enter] upload   [Esc] cancel",
            self.path_input.buffer
        );

        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL).title(" Choose PDF "))
                .wrap(Wrap { trim: false }),
            popup_area,
        );
    }

    fn render_page_jump(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(40, 15, area);
        let total = self.upload.total_pages().unwrap_or(0);
        let text = format!(
            "Go to page (1-{total}):\n\n{}█\n\n[Enter] go   [Esc] cancel",
            self.page_input.buffer
        );

        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Jump ")),
            popup_area,
        );
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let outer = Block::default().borders(Borders::ALL).title(" Settings ");
        let inner = outer.inner(popup_area);
        frame.render_widget(outer, popup_area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(ModelId::ALL.len() as u16 * 2 + 2),
                Constraint::Length(2),
                Constraint::Min(1),
            ])
            .split(inner);

        let focused = Style::default().fg(Color::Yellow);
        let key_style = if self.editor.field() == EditorField::ApiKey {
            focused
        } else {
            Style::default()
        };
        let key_text = if self.editor.staged_key().is_empty() {
            Span::styled(
                "empty: the shared default key is used",
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::raw(self.editor.key_display())
        };
        frame.render_widget(
            Paragraph::new(Line::from(key_text)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(key_style)
                    .title(if self.editor.is_key_visible() {
                        " API key (visible) "
                    } else {
                        " API key "
                    }),
            ),
            rows[0],
        );

        let items: Vec<ListItem> = ModelId::ALL
            .iter()
            .map(|model| {
                let enabled = self.editor.is_model_enabled(*model);
                let selected = *model == self.editor.staged_model();
                let marker = if selected { "(•)" } else { "( )" };
                let lock = if enabled { "" } else { LOCK_MARKER };
                let style = if enabled {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(vec![
                    Line::from(format!("{marker} {} {lock}", model.display_name())),
                    Line::from(format!("    {}", model.description())),
                ])
                .style(style)
            })
            .collect();
        let model_style = if self.editor.field() == EditorField::Model {
            focused
        } else {
            Style::default()
        };
        frame.render_widget(
            List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(model_style)
                    .title(" Model "),
            ),
            rows[1],
        );

        if let Some(error) = self.editor.error() {
            frame.render_widget(
                Paragraph::new(error.to_string()).style(Style::default().fg(Color::Red)),
                rows[2],
            );
        }

        frame.render_widget(
            Paragraph::new(
                "[Tab] field  [↑/↓] model  [Ctrl+V] show key  [Ctrl+X] clear  [Enter] save  [Esc] cancel",
            )
            .wrap(Wrap { trim: true }),
            rows[3],
        );
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 70, area);

        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(self.keybinds.help_text()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Help - Press ? to close "),
            ),
            popup_area,
        );
    }

    fn render_error_details(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 25, area);
        let details = self
            .last_error
            .as_deref()
            .unwrap_or("No error details available.");

        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(format!("{details}\n\n[Esc] or [Enter] to close"))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Error Details "),
                )
                .wrap(Wrap { trim: false }),
            popup_area,
        );
    }
}

fn nav_span(label: &'static str, enabled: bool) -> Span<'static> {
    if enabled {
        Span::raw(label)
    } else {
        Span::styled(label, Style::default().fg(Color::DarkGray))
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(r);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
