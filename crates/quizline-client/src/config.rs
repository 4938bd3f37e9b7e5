//! Client configuration and backend factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizline_core::controller::ControllerConfig;
use quizline_core::model::Locale;

use crate::http::HttpQuizBackend;

/// Top-level quizline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizlineConfig {
    /// Base URL of the quiz service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Locale loaded when a session starts.
    #[serde(default)]
    pub default_locale: Locale,
    /// Upper bound on each network call, in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Retries on transient question-load failures.
    #[serde(default = "default_retries")]
    pub max_load_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://bjp-quiz-backend-lzy3caj3ca-el.a.run.app".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    500
}

impl Default for QuizlineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_locale: Locale::default(),
            request_timeout_secs: default_timeout(),
            max_load_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl QuizlineConfig {
    /// Controller settings derived from this configuration.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_load_retries: self.max_load_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.base_url.starts_with("http://") || self.base_url.starts_with("https://"),
            "base_url must start with http:// or https://, got '{}'",
            self.base_url
        );
        anyhow::ensure!(
            self.request_timeout_secs >= 1,
            "request_timeout_secs must be at least 1"
        );
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Apply `QUIZLINE_BASE_URL` and `QUIZLINE_LOCALE` overrides, looked up
/// through `lookup`.
fn apply_env_overrides(
    config: &mut QuizlineConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(url) = lookup("QUIZLINE_BASE_URL") {
        config.base_url = url;
    }
    if let Some(locale) = lookup("QUIZLINE_LOCALE") {
        config.default_locale = locale
            .parse()
            .map_err(|e: String| anyhow::anyhow!("QUIZLINE_LOCALE: {e}"))?;
    }
    Ok(())
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `quizline.toml` in the current directory
/// 2. `~/.config/quizline/config.toml`
///
/// Environment variable overrides: `QUIZLINE_BASE_URL`, `QUIZLINE_LOCALE`.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizlineConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizline.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizlineConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizlineConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.base_url = resolve_env_vars(&config.base_url);
    config.validate()?;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizline"))
}

/// Create the HTTP backend described by `config`.
pub fn create_backend(config: &QuizlineConfig) -> Result<Arc<HttpQuizBackend>> {
    let backend = HttpQuizBackend::new(
        &config.base_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    Ok(Arc::new(backend))
}
