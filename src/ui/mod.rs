pub mod app;
pub mod center_panel;
pub mod settings;
pub mod settings_io;
