use std::fs;
use std::path::PathBuf;

use crate::config::APP_DIR;
use crate::ui::settings::UiSettings;

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    if let Err(e) = fs::create_dir_all(&path) {
        tracing::warn!(dir = %path.display(), error = %e, "cannot create settings dir");
    }
    path.push("ui_settings.json");
    path
}

pub fn load_settings() -> UiSettings {
    let path = settings_path();
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn save_settings(settings: &UiSettings) {
    let path = settings_path();
    let result = serde_json::to_string_pretty(settings)
        .map_err(anyhow::Error::from)
        .and_then(|json| fs::write(&path, json).map_err(anyhow::Error::from));

    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "failed to save ui settings");
    }
}
