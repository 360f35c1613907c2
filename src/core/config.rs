use crate::providers::util::RetryPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NaverProviderConfig {
    /// Chart and foreign financials host.
    pub api_base_url: String,
    /// Mobile site host: index series, domestic financials, rankings.
    pub mobile_base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NasdaqProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProvidersConfig {
    pub naver: NaverProviderConfig,
    pub yahoo: YahooProviderConfig,
    pub nasdaq: NasdaqProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            naver: NaverProviderConfig {
                api_base_url: "https://api.stock.naver.com".to_string(),
                mobile_base_url: "https://m.stock.naver.com".to_string(),
            },
            yahoo: YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            },
            nasdaq: NasdaqProviderConfig {
                base_url: "https://api.nasdaq.com".to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first.
    pub attempts: usize,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            attempts: 3,
            delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.delay_ms))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TelegramConfig {
    pub base_url: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        TelegramConfig {
            base_url: "https://api.telegram.org".to_string(),
            bot_token: None,
            chat_id: None,
        }
    }
}

impl TelegramConfig {
    /// Credentials, with `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID` taking
    /// precedence over the file.
    pub fn credentials(&self) -> Option<(String, String)> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.bot_token.clone())?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.chat_id.clone())?;
        Some((token, chat_id))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub http: HttpConfig,
    pub telegram: TelegramConfig,
    /// Windows used when no `--ma` is given on the command line.
    pub moving_averages: Vec<usize>,
    pub database_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            http: HttpConfig::default(),
            telegram: TelegramConfig::default(),
            moving_averages: vec![5, 20, 60],
            database_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// An explicit path must exist; the default location falls back to
    /// built-in defaults when nothing has been set up yet.
    pub fn load_or_default(config_path: Option<&str>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_path(path);
        }
        let default_path = Self::default_config_path()?;
        if default_path.exists() {
            Self::load_from_path(&default_path)
        } else {
            debug!(
                "No config at {}, using defaults",
                default_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("kr", "kmarket", "kmarket")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_database_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.database_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("kr", "kmarket", "kmarket")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("users.db"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}
