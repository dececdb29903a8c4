use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const APP_DIR: &str = "arduino_expert";

const CONFIG_ENV: &str = "ARDUINO_EXPERT_CONFIG";
const API_KEY_ENVS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];
const FIRESTORE_TOKEN_ENV: &str = "FIRESTORE_ACCESS_TOKEN";
const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub knowledge: KnowledgeConfig,
    pub prompt: PromptConfig,
    pub cache: CacheConfig,
    pub persistence: PersistenceConfig,
    pub notify: NotifyConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub name: String,
    pub temperature: Option<f32>,
    pub stream: bool,
    /// Usually left empty in the file and supplied through the environment.
    pub api_key: String,
}

// Hand-written so the key never reaches a log line.
impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("base_url", &self.base_url)
            .field("name", &self.name)
            .field("temperature", &self.temperature)
            .field("stream", &self.stream)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".into(),
            name: "gemini-2.5-flash".into(),
            temperature: None,
            stream: false,
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub path: PathBuf,
    /// Send only this many leading characters of the knowledge text.
    pub max_chars: Option<usize>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("knowledge.txt"),
            max_chars: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    #[default]
    Grounded,
    Strict,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub style: PromptStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    #[default]
    None,
    File,
    Firestore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub backend: PersistenceBackend,
    pub project_id: String,
    pub collection: String,
    /// Overrides `<data_dir>/arduino_expert/sessions` for the file backend.
    pub dir: Option<PathBuf>,
    #[serde(skip)]
    pub access_token: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::None,
            project_id: String::new(),
            collection: "chats".into(),
            dir: None,
            access_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub from: String,
    pub to: String,
    #[serde(skip)]
    pub password: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".into(),
            smtp_port: 465,
            username: String::new(),
            from: String::new(),
            to: String::new(),
            password: String::new(),
        }
    }
}

impl AppConfig {
    /// Loads the config file (if any) and fills secrets from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.knowledge.max_chars == Some(0) {
            return Err(ConfigError::Invalid(
                "knowledge.max_chars must be at least 1; omit it to send the whole file".into(),
            ));
        }
        Ok(())
    }

    /// Environment values win over the file for every secret.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = API_KEY_ENVS.iter().find_map(|&k| non_empty(k)) {
            self.model.api_key = key;
        }
        if let Some(token) = non_empty(FIRESTORE_TOKEN_ENV) {
            self.persistence.access_token = token;
        }
        if let Some(password) = non_empty(SMTP_PASSWORD_ENV) {
            self.notify.password = password;
        }
    }
}

fn config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push("config.toml");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.model.name, "gemini-2.5-flash");
        assert_eq!(config.knowledge.path, PathBuf::from("knowledge.txt"));
        assert_eq!(config.prompt.style, PromptStyle::Grounded);
        assert!(!config.cache.enabled);
        assert_eq!(config.persistence.backend, PersistenceBackend::None);
    }

    #[test]
    fn parses_sections() {
        let config = AppConfig::from_toml(
            r#"
            [model]
            name = "gemini-1.5-flash"
            stream = true

            [knowledge]
            max_chars = 12000

            [prompt]
            style = "strict"

            [cache]
            enabled = true
            capacity = 8

            [persistence]
            backend = "firestore"
            project_id = "arduino-expert"
            "#,
        )
        .unwrap();

        assert_eq!(config.model.name, "gemini-1.5-flash");
        assert!(config.model.stream);
        assert_eq!(config.knowledge.max_chars, Some(12000));
        assert_eq!(config.prompt.style, PromptStyle::Strict);
        assert_eq!(config.cache.capacity, 8);
        assert_eq!(config.persistence.backend, PersistenceBackend::Firestore);
        assert_eq!(config.persistence.collection, "chats");
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = AppConfig::from_toml("[persistence]\nbackend = \"mongo\"\n");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_zero_knowledge_limit() {
        let err = AppConfig::from_toml("[knowledge]\nmax_chars = 0\n");
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn env_supplies_secrets() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", ""),
            ("GOOGLE_API_KEY", "google-key"),
            ("SMTP_PASSWORD", "hunter2"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.model.api_key, "google-key");
        assert_eq!(config.notify.password, "hunter2");
        assert!(config.persistence.access_token.is_empty());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let mut config = ModelConfig::default();
        config.api_key = "secret-value".into();
        let shown = format!("{config:?}");
        assert!(!shown.contains("secret-value"));
        assert!(shown.contains("<redacted>"));
    }
}
