use std::sync::Arc;

use scout_core::config::{AppConfig, ConfigError, LoadOptions};
use scout_core::{CollectionPipeline, FilterStore};
use scout_telegram::{AnalysisRunner, BotState, ChatApi, CommandRouter, TeloxideChat};
use scout_vendor::{VendorClient, VendorClientError};
use secrecy::ExposeSecret;
use teloxide::Bot;
use thiserror::Error;
use tracing::info;

use crate::health::HealthState;

pub struct Application {
    pub config: AppConfig,
    pub filters: FilterStore,
    pub runner: AnalysisRunner,
    pub router: Arc<CommandRouter<AnalysisRunner>>,
    pub chat: Arc<dyn ChatApi>,
    pub bot: Bot,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("vendor client setup failed: {0}")]
    Vendor(#[from] VendorClientError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

/// Wires the vendor client, pipeline, runner and chat adapter. Makes no
/// network calls.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let vendor = VendorClient::new(&config.vendor)?;
    info!(
        event_name = "system.bootstrap.vendor_ready",
        correlation_id = "bootstrap",
        base_url = %vendor.base_url(),
        "vendor client configured"
    );

    let filters = FilterStore::new(config.filters);
    let pipeline = Arc::new(CollectionPipeline::new(
        Arc::new(vendor),
        filters.clone(),
        config.pipeline.settings(),
    ));

    let bot = Bot::new(config.telegram.bot_token.expose_secret());
    let chat: Arc<dyn ChatApi> = Arc::new(TeloxideChat::new(bot.clone()));
    let runner = AnalysisRunner::new(pipeline, Arc::clone(&chat));
    let router = Arc::new(CommandRouter::new(filters.clone(), runner.clone()));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        max_followers = config.filters.max_followers,
        min_views = config.filters.min_views,
        min_popular_posts = config.filters.min_popular_posts,
        "application wired"
    );

    Ok(Application { config, filters, runner, router, chat, bot })
}

impl Application {
    pub fn bot_state(&self, bot_username: Option<String>) -> BotState {
        BotState::new(Arc::clone(&self.router), Arc::clone(&self.chat), bot_username)
    }

    pub fn health_state(&self) -> HealthState {
        HealthState::new(self.filters.clone(), self.runner.clone())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use scout_core::config::{ConfigOverrides, LoadOptions};
    use scout_core::FilterUpdate;

    use super::{bootstrap, Application};

    pub(crate) fn valid_options() -> LoadOptions {
        LoadOptions {
            require_chat_token: true,
            overrides: ConfigOverrides {
                telegram_bot_token: Some("123456:test-token".to_string()),
                vendor_api_key: Some("rapid-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    pub(crate) fn application() -> Application {
        match bootstrap(valid_options()) {
            Ok(app) => app,
            Err(error) => panic!("bootstrap should succeed with valid overrides: {error}"),
        }
    }

    #[test]
    fn bootstrap_fails_fast_with_malformed_bot_token() {
        let result = bootstrap(LoadOptions {
            require_chat_token: true,
            overrides: ConfigOverrides {
                telegram_bot_token: Some("invalid-token".to_string()),
                vendor_api_key: Some("rapid-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("telegram.bot_token"), "unexpected error: {message}");
    }

    #[test]
    fn router_and_pipeline_share_one_filter_store() {
        let app = application();

        let update = FilterUpdate::parse("views 100").unwrap_or_else(|error| panic!("{error}"));
        app.router.filters().set(update.param, update.value);

        assert_eq!(app.filters.snapshot().min_views, 100);
        assert_eq!(app.runner.active_runs(), 0);
    }
}
