use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use scout_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// One rendered configuration key. `env_keys` are checked in the same order
/// the loader reads them, so the first one set is the effective source.
struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

impl Field {
    fn new(key: &'static str, env_keys: &'static [&'static str], value: impl ToString) -> Self {
        Self { key, env_keys, value: value.to_string() }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let vendor = &config.vendor;
    let pipeline = &config.pipeline;
    let filters = &config.filters;
    let server = &config.server;

    vec![
        Field::new(
            "telegram.bot_token",
            &["SCOUT_TELEGRAM_BOT_TOKEN", "BOT_TOKEN"],
            redact_bot_token(config.telegram.bot_token.expose_secret()),
        ),
        Field::new("vendor.base_url", &["SCOUT_VENDOR_BASE_URL"], &vendor.base_url),
        Field::new("vendor.api_host", &["SCOUT_VENDOR_API_HOST"], &vendor.api_host),
        Field::new(
            "vendor.api_key",
            &["SCOUT_VENDOR_API_KEY", "RAPIDAPI_KEY"],
            redact_secret(vendor.api_key.expose_secret()),
        ),
        Field::new("vendor.timeout_secs", &["SCOUT_VENDOR_TIMEOUT_SECS"], vendor.timeout_secs),
        Field::new("vendor.post_attempts", &["SCOUT_VENDOR_POST_ATTEMPTS"], vendor.post_attempts),
        Field::new(
            "vendor.post_backoff_ms",
            &["SCOUT_VENDOR_POST_BACKOFF_MS"],
            vendor.post_backoff_ms,
        ),
        Field::new("vendor.posts_per_request", &[], vendor.posts_per_request),
        Field::new("pipeline.page_size", &["SCOUT_PIPELINE_PAGE_SIZE"], pipeline.page_size),
        Field::new(
            "pipeline.page_delay_ms",
            &["SCOUT_PIPELINE_PAGE_DELAY_MS"],
            pipeline.page_delay_ms,
        ),
        Field::new("pipeline.progress_every", &[], pipeline.progress_every),
        Field::new("pipeline.progress_interval_ms", &[], pipeline.progress_interval_ms),
        Field::new("pipeline.profile_url_prefix", &[], &pipeline.profile_url_prefix),
        Field::new(
            "filters.max_followers",
            &["SCOUT_FILTERS_MAX_FOLLOWERS"],
            filters.max_followers,
        ),
        Field::new("filters.min_views", &["SCOUT_FILTERS_MIN_VIEWS"], filters.min_views),
        Field::new(
            "filters.min_popular_posts",
            &["SCOUT_FILTERS_MIN_POPULAR_POSTS"],
            filters.min_popular_posts,
        ),
        Field::new("server.bind_address", &["SCOUT_SERVER_BIND_ADDRESS"], &server.bind_address),
        Field::new(
            "server.health_check_port",
            &["SCOUT_SERVER_HEALTH_CHECK_PORT"],
            server.health_check_port,
        ),
        Field::new(
            "server.health_enabled",
            &["SCOUT_SERVER_HEALTH_ENABLED"],
            server.health_enabled,
        ),
        Field::new(
            "logging.level",
            &["SCOUT_LOGGING_LEVEL", "SCOUT_LOG_LEVEL"],
            &config.logging.level,
        ),
        Field::new(
            "logging.format",
            &["SCOUT_LOGGING_FORMAT", "SCOUT_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_lowercase(),
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config file"));
            return format!("file ({})", file_path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the numeric bot id, which is public, and hides the secret half.
fn redact_bot_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((bot_id, _)) = trimmed.split_once(':') {
        return format!("{bot_id}:***");
    }

    "<redacted>".to_string()
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<unset>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
