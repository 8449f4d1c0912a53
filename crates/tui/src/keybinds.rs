pub struct Keybinds;

impl Default for Keybinds {
    fn default() -> Self {
        Self
    }
}

impl Keybinds {
    pub fn help_text(&self) -> String {
        r#"Keyboard Shortcuts:

Document:
  o             Choose a PDF to upload
  Enter         Upload the typed path
  ← / →         Previous/next page
  g             Jump to page (type a number)
  e             Explain the current page
  r             Close the document

Settings:
  s             Open settings
  Tab           Switch between key and model
  ↑ / ↓         Choose model
  Ctrl + V      Show/hide the API key
  Ctrl + X      Clear saved settings
  Enter         Save
  Esc           Cancel

General:
  ?             Toggle this help
  Shift + E     Show latest error details
  Ctrl + Q      Quit

Mouse:
  Click + drag  Resize the viewer
"#
        .to_string()
    }
}
