use reqwest::Url;
use scout_core::config::{AppConfig, ConfigError, LoadOptions};
use serde::Serialize;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Exit code 0 when every check passes, 1 otherwise.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(AppConfig::load(LoadOptions::default()));
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(loaded: Result<AppConfig, ConfigError>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.push(check_bot_token(&config));
            checks.push(DoctorCheck::pass(
                "vendor_credentials",
                "vendor api key present (validated by config contract)",
            ));
            checks.push(check_vendor_endpoint(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("telegram_token_readiness"));
            checks.push(DoctorCheck::skipped("vendor_credentials"));
            checks.push(DoctorCheck::skipped("vendor_endpoint"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Offline tooling loads config without the chat token, so the bot's
/// stricter validation is rerun here.
fn check_bot_token(config: &AppConfig) -> DoctorCheck {
    match config.validate(true) {
        Ok(()) => DoctorCheck::pass("telegram_token_readiness", "bot token format is valid"),
        Err(error) => DoctorCheck::fail("telegram_token_readiness", error.to_string()),
    }
}

fn check_vendor_endpoint(config: &AppConfig) -> DoctorCheck {
    let url = match Url::parse(&config.vendor.base_url) {
        Ok(url) => url,
        Err(error) => {
            return DoctorCheck::fail(
                "vendor_endpoint",
                format!("vendor.base_url `{}` is not a valid URL: {error}", config.vendor.base_url),
            );
        }
    };

    let Some(host) = url.host_str() else {
        return DoctorCheck::fail("vendor_endpoint", "vendor.base_url has no host");
    };

    if url.scheme() == "https" && host != config.vendor.api_host {
        return DoctorCheck::fail(
            "vendor_endpoint",
            format!(
                "vendor.api_host `{}` does not match base_url host `{host}`",
                config.vendor.api_host
            ),
        );
    }

    DoctorCheck::pass("vendor_endpoint", format!("requests go to `{url}`"))
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
