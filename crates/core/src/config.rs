use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collect::{PipelineSettings, DEFAULT_PROFILE_URL_PREFIX};
use crate::filters::FilterConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub vendor: VendorConfig,
    pub pipeline: PipelineConfig,
    pub filters: FilterConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct VendorConfig {
    pub base_url: String,
    pub api_host: String,
    pub api_key: SecretString,
    pub timeout_secs: u64,
    pub post_attempts: u32,
    pub post_backoff_ms: u64,
    pub posts_per_request: u32,
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub page_size: u32,
    pub page_delay_ms: u64,
    pub progress_every: usize,
    pub progress_interval_ms: u64,
    pub profile_url_prefix: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub health_enabled: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub vendor_base_url: Option<String>,
    pub vendor_api_key: Option<String>,
    pub page_delay_ms: Option<u64>,
    pub post_backoff_ms: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    /// The bot needs a chat token; offline tooling does not.
    pub require_chat_token: bool,
    pub overrides: ConfigOverrides,
}

impl LoadOptions {
    pub fn for_bot() -> Self {
        Self { require_chat_token: true, ..Self::default() }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig { bot_token: String::new().into() },
            vendor: VendorConfig {
                base_url: "https://tiktok-api23.p.rapidapi.com".to_string(),
                api_host: "tiktok-api23.p.rapidapi.com".to_string(),
                api_key: String::new().into(),
                timeout_secs: 30,
                post_attempts: 3,
                post_backoff_ms: 1_000,
                posts_per_request: 50,
            },
            pipeline: PipelineConfig {
                page_size: 50,
                page_delay_ms: 1_000,
                progress_every: 10,
                progress_interval_ms: 3_000,
                profile_url_prefix: DEFAULT_PROFILE_URL_PREFIX.to_string(),
            },
            filters: FilterConfig::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                health_enabled: true,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl PipelineConfig {
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            page_size: self.page_size,
            page_delay: Duration::from_millis(self.page_delay_ms),
            progress_every: self.progress_every,
            progress_interval: Duration::from_millis(self.progress_interval_ms),
            profile_url_prefix: self.profile_url_prefix.clone(),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("scout.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate(options.require_chat_token)?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(telegram) = patch.telegram {
            if let Some(bot_token) = telegram.bot_token {
                self.telegram.bot_token = secret_value(bot_token);
            }
        }

        if let Some(vendor) = patch.vendor {
            if let Some(base_url) = vendor.base_url {
                self.vendor.base_url = base_url;
            }
            if let Some(api_host) = vendor.api_host {
                self.vendor.api_host = api_host;
            }
            if let Some(api_key) = vendor.api_key {
                self.vendor.api_key = secret_value(api_key);
            }
            if let Some(timeout_secs) = vendor.timeout_secs {
                self.vendor.timeout_secs = timeout_secs;
            }
            if let Some(post_attempts) = vendor.post_attempts {
                self.vendor.post_attempts = post_attempts;
            }
            if let Some(post_backoff_ms) = vendor.post_backoff_ms {
                self.vendor.post_backoff_ms = post_backoff_ms;
            }
            if let Some(posts_per_request) = vendor.posts_per_request {
                self.vendor.posts_per_request = posts_per_request;
            }
        }

        if let Some(pipeline) = patch.pipeline {
            if let Some(page_size) = pipeline.page_size {
                self.pipeline.page_size = page_size;
            }
            if let Some(page_delay_ms) = pipeline.page_delay_ms {
                self.pipeline.page_delay_ms = page_delay_ms;
            }
            if let Some(progress_every) = pipeline.progress_every {
                self.pipeline.progress_every = progress_every;
            }
            if let Some(progress_interval_ms) = pipeline.progress_interval_ms {
                self.pipeline.progress_interval_ms = progress_interval_ms;
            }
            if let Some(profile_url_prefix) = pipeline.profile_url_prefix {
                self.pipeline.profile_url_prefix = profile_url_prefix;
            }
        }

        if let Some(filters) = patch.filters {
            if let Some(max_followers) = filters.max_followers {
                self.filters.max_followers = max_followers;
            }
            if let Some(min_views) = filters.min_views {
                self.filters.min_views = min_views;
            }
            if let Some(min_popular_posts) = filters.min_popular_posts {
                self.filters.min_popular_posts = min_popular_posts;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(health_enabled) = server.health_enabled {
                self.server.health_enabled = health_enabled;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let bot_token = read_env("SCOUT_TELEGRAM_BOT_TOKEN").or_else(|| read_env("BOT_TOKEN"));
        if let Some(value) = bot_token {
            self.telegram.bot_token = secret_value(value);
        }

        if let Some(value) = read_env("SCOUT_VENDOR_BASE_URL") {
            self.vendor.base_url = value;
        }
        if let Some(value) = read_env("SCOUT_VENDOR_API_HOST") {
            self.vendor.api_host = value;
        }
        let api_key = read_env("SCOUT_VENDOR_API_KEY").or_else(|| read_env("RAPIDAPI_KEY"));
        if let Some(value) = api_key {
            self.vendor.api_key = secret_value(value);
        }
        if let Some(value) = read_env("SCOUT_VENDOR_TIMEOUT_SECS") {
            self.vendor.timeout_secs = parse_u64("SCOUT_VENDOR_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SCOUT_VENDOR_POST_ATTEMPTS") {
            self.vendor.post_attempts = parse_u32("SCOUT_VENDOR_POST_ATTEMPTS", &value)?;
        }
        if let Some(value) = read_env("SCOUT_VENDOR_POST_BACKOFF_MS") {
            self.vendor.post_backoff_ms = parse_u64("SCOUT_VENDOR_POST_BACKOFF_MS", &value)?;
        }

        if let Some(value) = read_env("SCOUT_PIPELINE_PAGE_SIZE") {
            self.pipeline.page_size = parse_u32("SCOUT_PIPELINE_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env("SCOUT_PIPELINE_PAGE_DELAY_MS") {
            self.pipeline.page_delay_ms = parse_u64("SCOUT_PIPELINE_PAGE_DELAY_MS", &value)?;
        }

        if let Some(value) = read_env("SCOUT_FILTERS_MAX_FOLLOWERS") {
            self.filters.max_followers = parse_u64("SCOUT_FILTERS_MAX_FOLLOWERS", &value)?;
        }
        if let Some(value) = read_env("SCOUT_FILTERS_MIN_VIEWS") {
            self.filters.min_views = parse_u64("SCOUT_FILTERS_MIN_VIEWS", &value)?;
        }
        if let Some(value) = read_env("SCOUT_FILTERS_MIN_POPULAR_POSTS") {
            self.filters.min_popular_posts =
                parse_u64("SCOUT_FILTERS_MIN_POPULAR_POSTS", &value)?;
        }

        if let Some(value) = read_env("SCOUT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SCOUT_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("SCOUT_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("SCOUT_SERVER_HEALTH_ENABLED") {
            self.server.health_enabled = parse_bool("SCOUT_SERVER_HEALTH_ENABLED", &value)?;
        }

        let log_level = read_env("SCOUT_LOGGING_LEVEL").or_else(|| read_env("SCOUT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("SCOUT_LOGGING_FORMAT").or_else(|| read_env("SCOUT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bot_token) = overrides.telegram_bot_token {
            self.telegram.bot_token = secret_value(bot_token);
        }
        if let Some(base_url) = overrides.vendor_base_url {
            self.vendor.base_url = base_url;
        }
        if let Some(api_key) = overrides.vendor_api_key {
            self.vendor.api_key = secret_value(api_key);
        }
        if let Some(page_delay_ms) = overrides.page_delay_ms {
            self.pipeline.page_delay_ms = page_delay_ms;
        }
        if let Some(post_backoff_ms) = overrides.post_backoff_ms {
            self.vendor.post_backoff_ms = post_backoff_ms;
        }
    }

    pub fn validate(&self, require_chat_token: bool) -> Result<(), ConfigError> {
        if require_chat_token {
            validate_telegram(&self.telegram)?;
        }
        validate_vendor(&self.vendor)?;
        validate_pipeline(&self.pipeline)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("scout.toml"), PathBuf::from("config/scout.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let token = telegram.bot_token.expose_secret().trim();
    if token.is_empty() {
        return Err(ConfigError::Validation(
            "telegram.bot_token is required. Create a bot with @BotFather and copy its token"
                .to_string(),
        ));
    }

    let well_formed = token
        .split_once(':')
        .map(|(id, secret)| {
            !id.is_empty() && id.chars().all(|ch| ch.is_ascii_digit()) && !secret.is_empty()
        })
        .unwrap_or(false);
    if !well_formed {
        return Err(ConfigError::Validation(
            "telegram.bot_token must look like `<numeric id>:<secret>` as issued by @BotFather"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_vendor(vendor: &VendorConfig) -> Result<(), ConfigError> {
    if vendor.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "vendor.api_key is required. Copy the X-RapidAPI-Key from the RapidAPI dashboard"
                .to_string(),
        ));
    }

    if !vendor.base_url.starts_with("http://") && !vendor.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "vendor.base_url must start with http:// or https://".to_string(),
        ));
    }

    if vendor.api_host.trim().is_empty() {
        return Err(ConfigError::Validation("vendor.api_host must not be empty".to_string()));
    }

    if vendor.timeout_secs == 0 || vendor.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "vendor.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if vendor.post_attempts == 0 {
        return Err(ConfigError::Validation(
            "vendor.post_attempts must be greater than zero".to_string(),
        ));
    }

    if vendor.posts_per_request == 0 {
        return Err(ConfigError::Validation(
            "vendor.posts_per_request must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_pipeline(pipeline: &PipelineConfig) -> Result<(), ConfigError> {
    if pipeline.page_size == 0 {
        return Err(ConfigError::Validation(
            "pipeline.page_size must be greater than zero".to_string(),
        ));
    }

    if pipeline.progress_every == 0 {
        return Err(ConfigError::Validation(
            "pipeline.progress_every must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_enabled && server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    telegram: Option<TelegramPatch>,
    vendor: Option<VendorPatch>,
    pipeline: Option<PipelinePatch>,
    filters: Option<FiltersPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VendorPatch {
    base_url: Option<String>,
    api_host: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    post_attempts: Option<u32>,
    post_backoff_ms: Option<u64>,
    posts_per_request: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelinePatch {
    page_size: Option<u32>,
    page_delay_ms: Option<u64>,
    progress_every: Option<usize>,
    progress_interval_ms: Option<u64>,
    profile_url_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FiltersPatch {
    max_followers: Option<u64>,
    min_views: Option<u64>,
    min_popular_posts: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    health_enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SCOUT_BOT_TOKEN", "12345:from-env");
        env::set_var("TEST_SCOUT_API_KEY", "rapid-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("scout.toml");
            fs::write(
                &path,
                r#"
[telegram]
bot_token = "${TEST_SCOUT_BOT_TOKEN}"

[vendor]
api_key = "${TEST_SCOUT_API_KEY}"

[filters]
max_followers = 5000
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                require_chat_token: true,
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.telegram.bot_token.expose_secret() == "12345:from-env",
                "bot token should be loaded from environment",
            )?;
            ensure(
                config.vendor.api_key.expose_secret() == "rapid-from-env",
                "api key should be loaded from environment",
            )?;
            ensure(config.filters.max_followers == 5_000, "file filter value should apply")?;
            ensure(config.filters.min_views == 7_000, "untouched filters keep defaults")?;
            Ok(())
        })();

        clear_vars(&["TEST_SCOUT_BOT_TOKEN", "TEST_SCOUT_API_KEY"]);
        result
    }

    #[test]
    fn legacy_env_names_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BOT_TOKEN", "777:legacy");
        env::set_var("RAPIDAPI_KEY", "legacy-key");
        env::set_var("SCOUT_LOG_LEVEL", "warn");
        env::set_var("SCOUT_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::for_bot())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.telegram.bot_token.expose_secret() == "777:legacy", "BOT_TOKEN alias")?;
            ensure(config.vendor.api_key.expose_secret() == "legacy-key", "RAPIDAPI_KEY alias")?;
            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["BOT_TOKEN", "RAPIDAPI_KEY", "SCOUT_LOG_LEVEL", "SCOUT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SCOUT_VENDOR_BASE_URL", "https://from-env.example");
        env::set_var("SCOUT_VENDOR_API_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("scout.toml");
            fs::write(
                &path,
                r#"
[vendor]
base_url = "https://from-file.example"
api_key = "key-from-file"

[pipeline]
page_delay_ms = 250

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    vendor_base_url: Some("https://from-override.example".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.vendor.base_url == "https://from-override.example",
                "override base url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.vendor.api_key.expose_secret() == "key-from-env",
                "env api key should win over file and defaults",
            )?;
            ensure(
                config.pipeline.settings().page_delay == Duration::from_millis(250),
                "file page delay should reach pipeline settings",
            )?;
            Ok(())
        })();

        clear_vars(&["SCOUT_VENDOR_BASE_URL", "SCOUT_VENDOR_API_KEY"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SCOUT_TELEGRAM_BOT_TOKEN", "not-a-token");
        env::set_var("SCOUT_VENDOR_API_KEY", "valid-key");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::for_bot()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("telegram.bot_token")
            );
            ensure(has_message, "validation failure should mention telegram.bot_token")?;

            AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("offline load should not need a chat token: {err}"))?;
            Ok(())
        })();

        clear_vars(&["SCOUT_TELEGRAM_BOT_TOKEN", "SCOUT_VENDOR_API_KEY"]);
        result
    }

    #[test]
    fn missing_api_key_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected missing api key failure".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("vendor.api_key")
            ),
            "validation failure should mention vendor.api_key",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SCOUT_TELEGRAM_BOT_TOKEN", "4242:secret-bot-value");
        env::set_var("SCOUT_VENDOR_API_KEY", "secret-api-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::for_bot())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("secret-bot-value"),
                "debug output should not contain bot token",
            )?;
            ensure(!debug.contains("secret-api-value"), "debug output should not contain api key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["SCOUT_TELEGRAM_BOT_TOKEN", "SCOUT_VENDOR_API_KEY"]);
        result
    }
}
