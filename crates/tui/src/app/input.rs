use super::*;

impl<S: KeyValueStore> App<S> {
    pub fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            _ => Ok(false),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return Ok(false);
        }

        if self.show_error_details {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('E')) {
                self.show_error_details = false;
            }
            return Ok(false);
        }

        match self.focus {
            Focus::Settings => self.handle_settings_key(key),
            Focus::PathPrompt => self.handle_path_key(key),
            Focus::PageJump => self.handle_page_jump_key(key),
            Focus::Viewer => self.handle_viewer_key(key),
        }
        Ok(self.should_quit)
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('E') => {
                if self.last_error.is_some() {
                    self.show_error_details = true;
                }
            }
            KeyCode::Char('o') => {
                // The trigger is disabled for the whole upload.
                if !self.upload.is_uploading() {
                    self.picker.open();
                    self.path_input.clear();
                    self.focus = Focus::PathPrompt;
                }
            }
            KeyCode::Char('s') => {
                self.editor.open(&self.settings);
                self.focus = Focus::Settings;
            }
            KeyCode::Char('r') => self.close_document(),
            KeyCode::Char('e') => self.request_explanation(),
            KeyCode::Char('g') => {
                if self.upload.is_loaded() {
                    self.page_input.clear();
                    self.focus = Focus::PageJump;
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if self.upload.prev_page() {
                    self.request_explanation();
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.upload.next_page() {
                    self.request_explanation();
                }
            }
            KeyCode::Esc => self.notice = None,
            _ => {}
        }
    }

    fn handle_path_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.picker.close();
                self.path_input.clear();
                self.focus = Focus::Viewer;
            }
            KeyCode::Enter => self.submit_path(),
            KeyCode::Backspace => self.path_input.handle_backspace(),
            KeyCode::Left => self.path_input.move_left(),
            KeyCode::Right => self.path_input.move_right(),
            KeyCode::Char(c) => self.path_input.handle_char(c),
            _ => {}
        }
    }

    fn handle_page_jump_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.focus = Focus::Viewer,
            KeyCode::Enter => {
                self.focus = Focus::Viewer;
                let typed = std::mem::take(&mut self.page_input.buffer);
                self.page_input.clear();
                match typed.trim().parse::<u32>() {
                    Ok(page) => {
                        if self.upload.go_to_page(page) {
                            self.request_explanation();
                        }
                    }
                    Err(_) => {
                        self.notice = Some(format!("'{}' is not a page number", typed.trim()))
                    }
                }
            }
            KeyCode::Backspace => self.page_input.handle_backspace(),
            KeyCode::Char(c) if c.is_ascii_digit() => self.page_input.handle_char(c),
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.editor.cancel();
                self.focus = Focus::Viewer;
            }
            KeyCode::Enter => self.save_settings(),
            KeyCode::Tab | KeyCode::BackTab => self.editor.toggle_field(),
            KeyCode::Char('v') if ctrl => self.editor.toggle_key_visibility(),
            KeyCode::Char('x') if ctrl => self.clear_settings(),
            KeyCode::Up | KeyCode::Down if self.editor.field() == EditorField::Model => {
                let forward = key.code == KeyCode::Down;
                let before = self.editor.staged_model();
                self.editor.cycle_model(forward);
                if self.editor.staged_model() == before {
                    if let Some(locked) = ModelId::ALL
                        .iter()
                        .copied()
                        .find(|m| !self.editor.is_model_enabled(*m))
                    {
                        if let Err(rejection) = self.editor.select_model(locked) {
                            self.editor.set_error(rejection.to_string());
                        }
                    }
                }
            }
            KeyCode::Backspace if self.editor.field() == EditorField::ApiKey => {
                self.editor.backspace()
            }
            KeyCode::Char(c) if !ctrl && self.editor.field() == EditorField::ApiKey => {
                self.editor.input_char(c)
            }
            _ => {}
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<bool> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.dragging_divider = self.layout.is_on_divider(mouse.column, mouse.row);
            }
            MouseEventKind::Drag(MouseButton::Left) if self.dragging_divider => {
                let delta = mouse.column as i16 - self.last_mouse_pos.0 as i16;
                self.layout.handle_drag(delta);
            }
            MouseEventKind::Up(MouseButton::Left) => self.dragging_divider = false,
            MouseEventKind::ScrollUp if self.focus == Focus::Viewer => {
                if self.upload.prev_page() {
                    self.request_explanation();
                }
            }
            MouseEventKind::ScrollDown if self.focus == Focus::Viewer => {
                if self.upload.next_page() {
                    self.request_explanation();
                }
            }
            _ => {}
        }
        self.last_mouse_pos = (mouse.column, mouse.row);
        Ok(false)
    }
}
