// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge doctor` command implementation.
//!
//! Runs diagnostic checks against the configuration, the Gemini endpoints
//! and the local audio devices, then prints one line per check.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use concierge_config::ConciergeConfig;
use concierge_core::{ConciergeError, HealthStatus, PluginAdapter};
use concierge_gemini::GeminiLiveProvider;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `concierge doctor` command.
///
/// With `plain`, or when stdout is not a terminal, prints without color.
pub async fn run_doctor(
    config: &ConciergeConfig,
    config_path: Option<&Path>,
    plain: bool,
) -> Result<(), ConciergeError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let mut results = vec![
        check_config(config_path),
        check_system_prompt(config).await,
        check_api_key(config),
    ];
    if config.gemini.resolve_api_key().is_some() {
        results.push(check_gemini_reachable(config).await);
        results.push(check_live_endpoint(config).await);
    }
    results.extend(check_audio_devices(config).await);
    results.push(check_memory_baseline());

    println!();
    println!("  concierge doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", format_line(result, use_color));
    }

    println!();
    match issues {
        0 => println!("  All checks passed."),
        1 => println!("  1 issue found."),
        n => println!("  {n} issues found."),
    }
    println!();

    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let duration_ms = result.duration.as_millis();
    let (symbol, message) = if use_color {
        match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.clone()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        }
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        (tag.to_string(), result.message.clone())
    };
    format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
}

/// Check configuration loads without errors.
fn check_config(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match path {
        Some(path) => concierge_config::load_and_validate_path(path),
        None => concierge_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check the configured system prompt file, if any, is readable.
async fn check_system_prompt(config: &ConciergeConfig) -> CheckResult {
    let start = Instant::now();
    match &config.agent.system_prompt_file {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(text) if text.trim().is_empty() => {
                CheckResult::new("System prompt", CheckStatus::Warn, format!("{path} is empty"), start)
            }
            Ok(_) => CheckResult::new("System prompt", CheckStatus::Pass, path.clone(), start),
            Err(e) => CheckResult::new(
                "System prompt",
                CheckStatus::Warn,
                format!("cannot read {path}: {e} (falling back)"),
                start,
            ),
        },
        None if config.agent.system_prompt.is_some() => {
            CheckResult::new("System prompt", CheckStatus::Pass, "inline", start)
        }
        None => CheckResult::new("System prompt", CheckStatus::Pass, "built-in", start),
    }
}

fn check_api_key(config: &ConciergeConfig) -> CheckResult {
    let start = Instant::now();
    match config.gemini.resolve_api_key() {
        Some(_) => CheckResult::new("Gemini API key", CheckStatus::Pass, "configured", start),
        None => CheckResult::new(
            "Gemini API key",
            CheckStatus::Fail,
            "not set (gemini.api_key or GEMINI_API_KEY)",
            start,
        ),
    }
}

/// Lists models with the configured key; costs no generation quota.
async fn check_gemini_reachable(config: &ConciergeConfig) -> CheckResult {
    const NAME: &str = "Gemini API";
    let start = Instant::now();

    let Some(key) = config.gemini.resolve_api_key() else {
        return CheckResult::new(NAME, CheckStatus::Warn, "no API key configured", start);
    };

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return CheckResult::new(NAME, CheckStatus::Fail, format!("HTTP client error: {e}"), start);
        }
    };

    let url = format!("{}/models", config.gemini.base_url.trim_end_matches('/'));
    match client.get(&url).header("x-goog-api-key", key).send().await {
        Ok(resp) if resp.status().is_success() => {
            CheckResult::new(NAME, CheckStatus::Pass, "reachable", start)
        }
        Ok(resp) if matches!(resp.status().as_u16(), 400 | 401 | 403) => CheckResult::new(
            NAME,
            CheckStatus::Fail,
            format!("API key rejected ({})", resp.status()),
            start,
        ),
        Ok(resp) => CheckResult::new(
            NAME,
            CheckStatus::Warn,
            format!("unexpected status {}", resp.status()),
            start,
        ),
        Err(e) => {
            let msg = if e.is_timeout() {
                "timeout (5s)".to_string()
            } else if e.is_connect() {
                "connection refused".to_string()
            } else {
                format!("error: {e}")
            };
            CheckResult::new(NAME, CheckStatus::Fail, msg, start)
        }
    }
}

async fn check_live_endpoint(config: &ConciergeConfig) -> CheckResult {
    let start = Instant::now();
    match GeminiLiveProvider::new(&config.gemini, config.audio.outbound_queue_frames) {
        Ok(provider) => adapter_check("Live endpoint", &provider, start).await,
        Err(e) => CheckResult::new("Live endpoint", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn adapter_check(name: &str, adapter: &dyn PluginAdapter, start: Instant) -> CheckResult {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => {
            CheckResult::new(name, CheckStatus::Pass, adapter.name().to_string(), start)
        }
        Ok(HealthStatus::Degraded(reason)) => CheckResult::new(name, CheckStatus::Warn, reason, start),
        Ok(HealthStatus::Unhealthy(reason)) => CheckResult::new(name, CheckStatus::Fail, reason, start),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

#[cfg(feature = "cpal")]
async fn check_audio_devices(config: &ConciergeConfig) -> Vec<CheckResult> {
    use concierge_audio::cpal_backend::{CpalAudioSink, CpalAudioSource};

    let input = CpalAudioSource::new(config.audio.input_device.clone());
    let output = CpalAudioSink::new(config.audio.output_device.clone());
    vec![
        adapter_check("Microphone", &input, Instant::now()).await,
        adapter_check("Speaker", &output, Instant::now()).await,
    ]
}

#[cfg(not(feature = "cpal"))]
async fn check_audio_devices(_config: &ConciergeConfig) -> Vec<CheckResult> {
    vec![CheckResult::new(
        "Audio devices",
        CheckStatus::Warn,
        "built without the `cpal` feature; voice sessions unavailable",
        Instant::now(),
    )]
}

fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let allocated_mb = allocated as f64 / (1024.0 * 1024.0);
        let resident_mb = resident as f64 / (1024.0 * 1024.0);
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Pass,
            format!("heap: {allocated_mb:.1} MB, resident: {resident_mb:.1} MB"),
            start,
        )
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Warn,
            "jemalloc not available on MSVC",
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ConciergeConfig {
        let mut config = ConciergeConfig::default();
        config.gemini.api_key = Some("test-key".into());
        config.gemini.base_url = server.uri();
        config
    }

    #[test]
    fn plain_lines_have_tags() {
        let result = CheckResult::new("Configuration", CheckStatus::Warn, "odd", Instant::now());
        let line = format_line(&result, false);
        assert!(line.contains("[WARN]"));
        assert!(line.contains("Configuration"));
        assert!(line.contains("odd"));
    }

    #[test]
    fn explicit_config_path_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[agent]\nunknown_key = 1\n").unwrap();
        assert_eq!(check_config(Some(path.as_path())).status, CheckStatus::Fail);
    }

    #[tokio::test]
    async fn unreadable_prompt_file_warns() {
        let mut config = ConciergeConfig::default();
        config.agent.system_prompt_file = Some("/nonexistent/concierge-prompt.md".into());
        let result = check_system_prompt(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("falling back"));
    }

    #[tokio::test]
    async fn default_prompt_is_built_in() {
        let result = check_system_prompt(&ConciergeConfig::default()).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.message, "built-in");
    }

    #[tokio::test]
    async fn reachable_api_passes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .mount(&server)
            .await;

        let result = check_gemini_reachable(&config_for(&server)).await;
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn rejected_key_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = check_gemini_reachable(&config_for(&server)).await;
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.contains("rejected"));
    }

    #[tokio::test]
    async fn non_websocket_live_url_fails() {
        let mut config = ConciergeConfig::default();
        config.gemini.api_key = Some("test-key".into());
        config.gemini.live_url = "https://example.invalid/live".into();
        let result = check_live_endpoint(&config).await;
        assert_eq!(result.status, CheckStatus::Fail);
    }

    #[test]
    fn memory_baseline_reports() {
        let result = check_memory_baseline();
        assert!(result.status == CheckStatus::Pass || result.status == CheckStatus::Warn);
    }
}
