//! Server configuration read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use standoff_core::suspicion::SuspicionLevel;
use standoff_session::application::settings::SessionSettings;
use standoff_session::domain::scenario::ScenarioScript;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DECISION_TIMEOUT_MS: u64 = 5000;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Endpoint of the decision service.
    pub decision_url: String,
    /// Deadline for one decision call.
    pub decision_timeout: Duration,
    /// Suspicion of a freshly started session.
    pub initial_suspicion: SuspicionLevel,
    /// Endpoint of the text-to-speech service. The synthesis route answers
    /// 503 when unset.
    pub tts_url: Option<String>,
    /// OTLP collector endpoint. Span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let decision_url = present("DECISION_URL").ok_or_else(|| {
            AppError::Config("DECISION_URL environment variable must be set".to_owned())
        })?;
        let host = present("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = parse_or(present("PORT"), "PORT", DEFAULT_PORT)?;
        let timeout_ms = parse_or(
            present("DECISION_TIMEOUT_MS"),
            "DECISION_TIMEOUT_MS",
            DEFAULT_DECISION_TIMEOUT_MS,
        )?;
        if timeout_ms == 0 {
            return Err(AppError::Config(
                "DECISION_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }
        let initial_suspicion: i64 = parse_or(present("INITIAL_SUSPICION"), "INITIAL_SUSPICION", 0)?;

        Ok(Self {
            host,
            port,
            decision_url,
            decision_timeout: Duration::from_millis(timeout_ms),
            initial_suspicion: SuspicionLevel::new(initial_suspicion),
            tts_url: present("TTS_URL"),
            otlp_endpoint: present("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form an address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Session settings derived from this configuration.
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            script: ScenarioScript {
                initial_suspicion: self.initial_suspicion,
                ..ScenarioScript::default()
            },
            decision_timeout: self.decision_timeout,
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_decision_url_is_set() {
        let config = config_from(&[("DECISION_URL", "http://decider:9000/decide")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.decision_timeout, Duration::from_secs(5));
        assert_eq!(config.initial_suspicion.value(), 0);
        assert_eq!(config.otlp_endpoint, None);
        assert_eq!(config.tts_url, None);
        assert_eq!(config.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_missing_decision_url_is_a_config_error() {
        let result = config_from(&[("PORT", "8080")]);
        assert!(matches!(result, Err(AppError::Config(message)) if message.contains("DECISION_URL")));
    }

    #[test]
    fn test_invalid_port_is_a_config_error() {
        let result = config_from(&[("DECISION_URL", "http://d"), ("PORT", "eighty")]);
        assert!(matches!(result, Err(AppError::Config(message)) if message.contains("PORT")));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = config_from(&[("DECISION_URL", "http://d"), ("DECISION_TIMEOUT_MS", "0")]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_initial_suspicion_is_clamped_into_session_settings() {
        let config = config_from(&[
            ("DECISION_URL", "http://d"),
            ("INITIAL_SUSPICION", "42"),
            ("DECISION_TIMEOUT_MS", "750"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();

        let settings = config.session_settings();

        assert_eq!(settings.script.initial_suspicion.value(), 10);
        assert_eq!(settings.decision_timeout, Duration::from_millis(750));
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_tts_url_is_read_and_blank_means_unset() {
        let set = config_from(&[
            ("DECISION_URL", "http://d"),
            ("TTS_URL", "http://tts:9100/speak"),
        ])
        .unwrap();
        let blank = config_from(&[("DECISION_URL", "http://d"), ("TTS_URL", "  ")]).unwrap();

        assert_eq!(set.tts_url.as_deref(), Some("http://tts:9100/speak"));
        assert_eq!(blank.tts_url, None);
    }
}
