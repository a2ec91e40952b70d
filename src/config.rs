//! Configuration: a JSON file under the user's home plus environment
//! overrides. The API key is only ever read from the environment and is
//! never written to the config file.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// System prompt shipped with the binary.
pub const AGENT_PROMPT: &str = "\
Ты — ассистент аптечной сети «Саламат». Помогаешь клиентам находить \
лекарства, узнавать, в каких аптеках они есть и по какой цене, и оформлять \
заказы.

Правила работы:
- Ищи товары инструментом find_product_in_vector_store; если клиент назвал \
товар неточно, предложи найденные варианты.
- Аптеки с товаром находи через find_all_pharmacies_by_product, цену в \
конкретной аптеке уточняй через get_current_price_for_product.
- Перед оформлением заказа обязательно проверь номер телефона клиента \
инструментом check_phone_number. Если номер некорректен, попроси другой.
- Заказ оформляй инструментом create_order только после того, как известны \
аптека, все товары с ценами, имя клиента, проверенный номер и способ оплаты.
- Если сумма заказа меньше 15000, доставка недоступна: заказ оформляется \
самовывозом из аптеки.
- Отвечай кратко, вежливо и по-русски.";

/// Default supplier feed location.
pub const DEFAULT_FEED_URL: &str = "https://salamat.cloud1c.pro/FileGPT/SalamatProducts.json";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub db: DbConfig,
    pub feed: FeedConfig,
}

/// Model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            base_url: crate::model::OPENAI_API_BASE_URL.to_string(),
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Reasoning steps allowed per run.
    pub recursion_limit: usize,
    /// Caller-side deadline for one user message, seconds.
    pub message_timeout_secs: u64,
    /// Where session files live; defaults under the data dir.
    pub session_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 10,
            message_timeout_secs: 300,
            session_dir: None,
        }
    }
}

/// Catalog database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// SQLite file path; defaults under the data dir.
    pub path: Option<PathBuf>,
}

/// Supplier feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
        }
    }
}

impl BotConfig {
    /// API key from the environment. Never stored in the config file.
    pub fn api_key() -> ConfigResult<String> {
        std::env::var("OPENAI_API_KEY").map_err(|_| ConfigError::MissingEnv("OPENAI_API_KEY"))
    }

    /// Resolved session directory.
    #[must_use]
    pub fn session_dir(&self) -> PathBuf {
        self.agent
            .session_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("sessions"))
    }

    /// Resolved catalog database path.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.db
            .path
            .clone()
            .unwrap_or_else(|| data_dir().join("catalog.db3"))
    }
}

/// Data directory for sessions and the catalog.
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".salamat-bot")
}

/// Path of the configuration file.
#[must_use]
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Load configuration from the default path, falling back to defaults when
/// the file does not exist.
pub async fn load_config() -> ConfigResult<BotConfig> {
    load_config_from(&config_path()).await
}

/// Load configuration from an explicit path.
pub async fn load_config_from(path: &std::path::Path) -> ConfigResult<BotConfig> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BotConfig::default()),
        Err(e) => Err(ConfigError::Io(e)),
    }
}

/// Write configuration to the default path.
pub async fn save_config(config: &BotConfig) -> ConfigResult<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(&path, content).await?;
    Ok(())
}

/// Create a default configuration file.
pub async fn init_config() -> ConfigResult<()> {
    save_config(&BotConfig::default()).await
}
