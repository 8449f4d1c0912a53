pub mod app;
pub mod config;
pub mod input;
pub mod keybinds;
pub mod settings_editor;
pub mod ui;
pub mod upload;

pub use config::Config;
