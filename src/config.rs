//! Configuration management for internscout using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ingest::{PipelineConfig, DEFAULT_STALE_AFTER_DAYS};
use crate::models::NewCompany;
use crate::repository::DbContext;
use crate::scheduler::DEFAULT_SCHEDULE;
use crate::scrapers::{FetchError, HttpClient, RateLimitConfig, RateLimiter};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "internscout.db";

/// Environment variable holding the admin bearer token.
pub const ADMIN_TOKEN_ENV: &str = "INTERNSCOUT_ADMIN_TOKEN";

/// Pause before the first retry of a transient fetch failure; doubles per attempt.
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Only `sqlite:` URLs are supported. Set via DATABASE_URL env var.
    pub database_url: Option<String>,
    /// User agent for HTTP requests (None = built-in, "impersonate" = browser).
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Minimum delay between requests to one domain, in milliseconds.
    pub request_delay_ms: u64,
    /// Companies scraped concurrently.
    pub workers: usize,
    /// Per-company time limit in seconds.
    pub company_timeout: u64,
    /// Retries for transient fetch failures.
    pub max_retries: u32,
    pub stale_after_days: i64,
    /// Cron expression (six fields, UTC) for scheduled runs.
    pub schedule: String,
    /// Postings are kept only if their title contains one of these.
    pub title_keywords: Vec<String>,
    /// Bearer token required by admin routes.
    pub admin_token: Option<String>,
    /// Default server bind address.
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("internscout");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            user_agent: None,
            request_timeout: 30,
            request_delay_ms: 1000,
            workers: 4,
            company_timeout: 60,
            max_retries: 2,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
            schedule: DEFAULT_SCHEDULE.to_string(),
            title_keywords: vec!["intern".to_string()],
            admin_token: None,
            bind: "127.0.0.1:3030".to_string(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        match self.database_url {
            Some(ref url) => PathBuf::from(url.strip_prefix("sqlite:").unwrap_or(url)),
            None => self.data_dir.join(&self.database_filename),
        }
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Ensure the data directory (and the database's parent) exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        if let Some(parent) = self.database_path().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Create a database context for the configured database.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }

    /// Tunables for the ingestion pipeline.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers.max(1),
            company_timeout: Duration::from_secs(self.company_timeout),
            stale_after: chrono::Duration::days(self.stale_after_days),
            title_keywords: self.title_keywords.clone(),
        }
    }

    /// Build the HTTP client used for careers pages.
    pub fn http_client(&self) -> Result<HttpClient, FetchError> {
        let limiter = RateLimiter::with_config(RateLimitConfig::with_base_delay(
            Duration::from_millis(self.request_delay_ms),
        ));
        Ok(HttpClient::new(
            Duration::from_secs(self.request_timeout),
            self.user_agent.as_deref(),
            limiter,
        )?
        .with_retries(self.max_retries, RETRY_BACKOFF))
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// Delay between requests in milliseconds.
    #[serde(default)]
    pub request_delay_ms: Option<u64>,
    #[serde(default)]
    pub workers: Option<usize>,
    /// Per-company time limit in seconds.
    #[serde(default)]
    pub company_timeout: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub stale_after_days: Option<i64>,
    /// Cron expression for scheduled runs.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub title_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub admin_token: Option<String>,
    #[serde(default)]
    pub bind: Option<String>,
    /// Companies imported by `init`.
    #[serde(default)]
    pub companies: Vec<NewCompany>,
    /// Path to the config file this was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers internscout config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("internscout").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.request_delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(timeout) = self.company_timeout {
            settings.company_timeout = timeout;
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries;
        }
        if let Some(days) = self.stale_after_days {
            settings.stale_after_days = days;
        }
        if let Some(ref schedule) = self.schedule {
            settings.schedule = schedule.clone();
        }
        if let Some(ref keywords) = self.title_keywords {
            settings.title_keywords = keywords.clone();
        }
        if let Some(ref token) = self.admin_token {
            settings.admin_token = Some(token.clone()).filter(|t| !t.is_empty());
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Data directory or database file (--target flag).
    pub data: Option<PathBuf>,
}

/// Split a `--target` path into a data directory and database filename.
fn resolve_data_path(path: &Path) -> (PathBuf, Option<String>) {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    let is_db_file = path
        .extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3");

    if is_db_file {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string());
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        (dir, filename)
    } else {
        (path, None)
    }
}

/// DATABASE_URL from the environment, if it names a SQLite database.
fn database_url_from_env() -> Option<String> {
    let url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty())?;
    let scheme = url.split_once("://").map(|(scheme, _)| scheme);
    match scheme {
        Some(s) if !s.starts_with("sqlite") => {
            tracing::warn!("Ignoring DATABASE_URL with unsupported scheme '{}'", s);
            None
        }
        _ => Some(url.replacen("sqlite://", "sqlite:", 1)),
    }
}

async fn load_file_config(options: &LoadOptions) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Config::default()
            });
    }

    // Priority 2: Auto-discover via prefer
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;

    let mut settings = Settings::default();

    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    config.apply_to_settings(&mut settings, &base_dir);

    // --target override takes precedence over the config file
    if let Some(ref data) = options.data {
        let (dir, filename) = resolve_data_path(data);
        settings.data_dir = dir;
        if let Some(filename) = filename {
            settings.database_filename = filename;
        }
    }

    // Environment variables take highest precedence
    if let Some(database_url) = database_url_from_env() {
        tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
        settings.database_url = Some(database_url);
    }
    if let Some(token) = std::env::var(ADMIN_TOKEN_ENV).ok().filter(|s| !s.is_empty()) {
        settings.admin_token = Some(token);
    }

    (settings, config)
}
