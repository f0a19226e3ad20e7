use std::env;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use scout_cli::commands::{analyze, config, doctor};
use serde_json::Value;

const READY_ENV: &[(&str, &str)] = &[
    ("SCOUT_TELEGRAM_BOT_TOKEN", "123456:bot-secret-value"),
    ("SCOUT_VENDOR_API_KEY", "rapid-secret-value"),
];

#[test]
fn config_redacts_secrets_and_attributes_sources() {
    with_env(
        &[
            ("BOT_TOKEN", "123456:bot-secret-value"),
            ("RAPIDAPI_KEY", "rapid-secret-value"),
            ("SCOUT_FILTERS_MIN_VIEWS", "12000"),
        ],
        || {
            let output = config::run();

            assert!(output.starts_with("effective config"));
            assert!(output
                .contains("- telegram.bot_token = 123456:*** (source: env (BOT_TOKEN))"));
            assert!(output.contains("- vendor.api_key = <redacted> (source: env (RAPIDAPI_KEY))"));
            assert!(output
                .contains("- filters.min_views = 12000 (source: env (SCOUT_FILTERS_MIN_VIEWS))"));
            assert!(output.contains("- filters.max_followers = 3000 (source: default)"));
            assert!(!output.contains("secret-value"));
        },
    );
}

#[test]
fn config_reports_validation_failure_without_vendor_key() {
    with_env(&[], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed"), "unexpected output: {output}");
    });
}

#[test]
fn doctor_passes_with_ready_env() {
    with_env(READY_ENV, || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "expected all checks to pass: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["checks"].as_array().map(Vec::len), Some(4));
    });
}

#[test]
fn doctor_fails_without_vendor_key() {
    with_env(&[("SCOUT_TELEGRAM_BOT_TOKEN", "123456:bot-secret-value")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation"));
        assert!(result.output.contains("- [skip] vendor_endpoint"));
    });
}

#[test]
fn analyze_rejects_empty_handle() {
    with_env(READY_ENV, || {
        let result = analyze::run(" @ ", Path::new("."));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "analyze");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_handle");
    });
}

#[test]
fn analyze_requires_vendor_key() {
    with_env(&[], || {
        let result = analyze::run("some.creator", Path::new("."));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn analyze_reports_unreachable_vendor_as_not_found() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut vars = READY_ENV.to_vec();
    vars.push(("SCOUT_VENDOR_BASE_URL", "http://127.0.0.1:9"));
    vars.push(("SCOUT_VENDOR_TIMEOUT_SECS", "2"));

    with_env(&vars, || {
        let result = analyze::run("@some.creator", dir.path());
        assert_eq!(result.exit_code, 4, "unexpected outcome: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "not_found");
    });

    let written = std::fs::read_dir(dir.path()).map(Iterator::count).unwrap_or_default();
    assert_eq!(written, 0);
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    let keys = [
        "SCOUT_TELEGRAM_BOT_TOKEN",
        "BOT_TOKEN",
        "SCOUT_VENDOR_BASE_URL",
        "SCOUT_VENDOR_API_HOST",
        "SCOUT_VENDOR_API_KEY",
        "RAPIDAPI_KEY",
        "SCOUT_VENDOR_TIMEOUT_SECS",
        "SCOUT_VENDOR_POST_ATTEMPTS",
        "SCOUT_VENDOR_POST_BACKOFF_MS",
        "SCOUT_PIPELINE_PAGE_SIZE",
        "SCOUT_PIPELINE_PAGE_DELAY_MS",
        "SCOUT_FILTERS_MAX_FOLLOWERS",
        "SCOUT_FILTERS_MIN_VIEWS",
        "SCOUT_FILTERS_MIN_POPULAR_POSTS",
        "SCOUT_SERVER_BIND_ADDRESS",
        "SCOUT_SERVER_HEALTH_CHECK_PORT",
        "SCOUT_SERVER_HEALTH_ENABLED",
        "SCOUT_LOGGING_LEVEL",
        "SCOUT_LOGGING_FORMAT",
        "SCOUT_LOG_LEVEL",
        "SCOUT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
