use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LookbookConfig {
    pub log: LogConfig,
    pub paths: PathsConfig,
    pub vision: VisionConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub blob: BlobConfig,
    pub completion: CompletionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub image_dir: String,
    pub embeddings_dir: String,
    pub output_file: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VisionConfig {
    pub endpoint: String,
    pub key: String,
    pub api_version: String,
    pub model_version: String,
    /// Per-request timeout. A timed-out request is retried like a connect failure.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
    pub concurrency: usize,
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub min_wait_secs: u64,
    pub max_wait_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub key: String,
    pub index_name: String,
    pub api_version: String,
    pub vector_profile: String,
    pub vector_algorithm: String,
    /// Final result count of a prompt search.
    pub result_top: usize,
    /// Vector candidate count used when the caller does not pass one.
    pub default_top_n: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BlobConfig {
    pub connection_string: String,
    pub account_key: String,
    pub container_name: String,
    pub sas_expiry_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub key: String,
    pub api_type: String,
    pub api_version: String,
    pub deployment: String,
    pub max_tokens: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            image_dir: "images".into(),
            embeddings_dir: "embeddings".into(),
            output_file: "output.jsonl".into(),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            key: String::new(),
            api_version: "2023-02-01-preview".into(),
            model_version: "latest".into(),
            request_timeout_secs: 60,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 1024,
            concurrency: 1,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            min_wait_secs: 15,
            max_wait_secs: 60,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            key: String::new(),
            index_name: String::new(),
            api_version: "2023-11-01".into(),
            vector_profile: "myHnswProfile".into(),
            vector_algorithm: "myHnsw".into(),
            result_top: 2,
            default_top_n: 5,
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            account_key: String::new(),
            container_name: String::new(),
            sas_expiry_secs: 3600,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            key: String::new(),
            api_type: "azure".into(),
            api_version: String::new(),
            deployment: "gpt-35-turbo".into(),
            max_tokens: 800,
        }
    }
}

/// Whether a required setting is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingState {
    Set,
    /// Empty, but supplied another way (the account key inside the connection string).
    Covered,
    Missing,
}

impl RetryConfig {
    pub fn min_wait(&self) -> Duration {
        Duration::from_secs(self.min_wait_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

/// Returns `~/.lookbook/`
pub fn default_lookbook_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lookbook")
}

/// Returns the config file path: `$LOOKBOOK_CONFIG` or `~/.lookbook/config.toml`
pub fn default_config_path() -> PathBuf {
    match std::env::var("LOOKBOOK_CONFIG") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => default_lookbook_dir().join("config.toml"),
    }
}

/// Return `value`, or an error naming the environment variable that should supply it.
pub fn require<'a>(value: &'a str, var: &str) -> Result<&'a str> {
    anyhow::ensure!(!value.trim().is_empty(), "{var} is not set");
    Ok(value)
}

impl LookbookConfig {
    /// Load `.env`, then the TOML file (if it exists), then apply env var overrides.
    pub fn load() -> Result<Self> {
        // A missing .env is normal in CI and containers.
        let _ = dotenv::dotenv();
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LookbookConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 13] = [
            ("AZURE_AI_SEARCH_ENDPOINT", &mut self.search.endpoint),
            ("AZURE_AI_SEARCH_KEY", &mut self.search.key),
            ("AZURE_AI_SEARCH_INDEX_NAME", &mut self.search.index_name),
            ("AZURE_BLOB_ACCOUNT_KEY", &mut self.blob.account_key),
            ("AZURE_BLOB_CONNECTION_STRING", &mut self.blob.connection_string),
            ("AZURE_BLOB_CONTAINER_NAME", &mut self.blob.container_name),
            ("AZURE_AI_VISION_ENDPOINT", &mut self.vision.endpoint),
            ("AZURE_AI_VISION_KEY", &mut self.vision.key),
            ("AZURE_OPENAI_ENDPOINT", &mut self.completion.endpoint),
            ("AZURE_OPENAI_KEY", &mut self.completion.key),
            ("AZURE_OPENAI_API_TYPE", &mut self.completion.api_type),
            ("AZURE_OPENAI_API_VERSION", &mut self.completion.api_version),
            ("LOOKBOOK_LOG_LEVEL", &mut self.log.level),
        ];
        for (var, slot) in overrides {
            if let Ok(val) = std::env::var(var) {
                *slot = val;
            }
        }
    }

    /// Every setting needed for full operation, paired with the variable that sets it.
    pub fn required_settings(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("AZURE_AI_SEARCH_ENDPOINT", self.search.endpoint.as_str()),
            ("AZURE_AI_SEARCH_KEY", self.search.key.as_str()),
            ("AZURE_AI_SEARCH_INDEX_NAME", self.search.index_name.as_str()),
            ("AZURE_BLOB_CONNECTION_STRING", self.blob.connection_string.as_str()),
            ("AZURE_BLOB_ACCOUNT_KEY", self.blob.account_key.as_str()),
            ("AZURE_BLOB_CONTAINER_NAME", self.blob.container_name.as_str()),
            ("AZURE_AI_VISION_ENDPOINT", self.vision.endpoint.as_str()),
            ("AZURE_AI_VISION_KEY", self.vision.key.as_str()),
            ("AZURE_OPENAI_ENDPOINT", self.completion.endpoint.as_str()),
            ("AZURE_OPENAI_KEY", self.completion.key.as_str()),
            ("AZURE_OPENAI_API_TYPE", self.completion.api_type.as_str()),
            ("AZURE_OPENAI_API_VERSION", self.completion.api_version.as_str()),
        ]
    }

    /// Whether the blob connection string already carries a non-empty `AccountKey`,
    /// which makes `AZURE_BLOB_ACCOUNT_KEY` optional.
    pub fn connection_string_has_key(&self) -> bool {
        self.blob
            .connection_string
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(key, value)| key == "AccountKey" && !value.is_empty())
    }

    /// State of one setting as `doctor` reports it.
    pub fn setting_state(&self, var: &str, value: &str) -> SettingState {
        if !value.trim().is_empty() {
            SettingState::Set
        } else if var == "AZURE_BLOB_ACCOUNT_KEY" && self.connection_string_has_key() {
            SettingState::Covered
        } else {
            SettingState::Missing
        }
    }

    /// Names of required settings that are empty and not covered by another setting.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        self.required_settings()
            .into_iter()
            .filter(|(var, value)| self.setting_state(var, value) == SettingState::Missing)
            .map(|(var, _)| var)
            .collect()
    }

    pub fn image_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.image_dir)
    }

    /// Path of the line-delimited embedding record file.
    pub fn records_path(&self) -> PathBuf {
        Path::new(&self.paths.embeddings_dir).join(&self.paths.output_file)
    }
}
