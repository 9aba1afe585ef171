//! Process-wide configuration
//!
//! Built once at startup (usually via [`Config::from_env`]) and shared
//! read-only with the orchestrator and provider clients afterwards.

use crate::error::ConfigError;
use crate::models::ProviderKind;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_FREEPIK_BASE_URL: &str =
    "https://api.freepik.com/v1/ai/gemini-2-5-flash-image-preview";
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_OUTPUT_DIR: &str = "./generated_images";

/// Connection settings for one backend.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub credential: SecretString,
    pub base_endpoint: String,
    /// Upper bound on task status checks. Always at least 1.
    pub max_poll_attempts: u32,
    pub poll_interval: Duration,
    /// Per-request timeout for non-streaming calls.
    pub request_timeout: Duration,
}

impl ProviderConfig {
    pub fn new(credential: impl Into<String>, base_endpoint: impl Into<String>) -> Self {
        Self {
            credential: SecretString::from(credential.into()),
            base_endpoint: base_endpoint.into().trim_end_matches('/').to_string(),
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_polling(mut self, max_poll_attempts: u32, poll_interval: Duration) -> Self {
        self.max_poll_attempts = max_poll_attempts.max(1);
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn has_credential(&self) -> bool {
        !self.credential.expose_secret().trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub default_provider: ProviderKind,
    pub gemini: ProviderConfig,
    pub gemini_model: String,
    pub freepik: ProviderConfig,
    pub output_dir: String,
}

/// Non-sensitive view of [`Config`] for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    pub ai_provider: String,
    pub has_gemini_key: bool,
    pub has_freepik_key: bool,
    pub output_dir: String,
}

impl Config {
    pub fn new(
        default_provider: ProviderKind,
        gemini: ProviderConfig,
        freepik: ProviderConfig,
    ) -> Self {
        Self {
            default_provider,
            gemini,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            freepik,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }

    pub fn with_gemini_model(mut self, model: impl Into<String>) -> Self {
        self.gemini_model = model.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<String>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Missing credentials are accepted here and reported by [`Config::validate`],
    /// so a process can start with only one provider configured.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_provider = match get("AI_PROVIDER") {
            Some(name) => name.parse()?,
            None => ProviderKind::Gemini,
        };

        let request_timeout = Duration::from_secs(parse_or(
            get("AI_REQUEST_TIMEOUT_SECS"),
            "AI_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?);

        let max_poll_attempts = parse_or(
            get("FREEPIK_MAX_POLL_ATTEMPTS"),
            "FREEPIK_MAX_POLL_ATTEMPTS",
            DEFAULT_MAX_POLL_ATTEMPTS,
        )?;
        if max_poll_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "FREEPIK_MAX_POLL_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        let poll_interval = Duration::from_millis(parse_or(
            get("FREEPIK_POLL_INTERVAL_MS"),
            "FREEPIK_POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL.as_millis() as u64,
        )?);

        let gemini = ProviderConfig::new(
            get("GEMINI_API_KEY").unwrap_or_default(),
            get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        )
        .with_request_timeout(request_timeout);

        let freepik = ProviderConfig::new(
            get("FREEPIK_API_KEY").unwrap_or_default(),
            get("FREEPIK_BASE_URL").unwrap_or_else(|| DEFAULT_FREEPIK_BASE_URL.to_string()),
        )
        .with_polling(max_poll_attempts, poll_interval)
        .with_request_timeout(request_timeout);

        Ok(Self {
            default_provider,
            gemini,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            freepik,
            output_dir: get("OUTPUT_DIR").unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
        })
    }

    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Freepik => &self.freepik,
        }
    }

    /// Check that `provider` can be used with this configuration.
    pub fn validate(&self, provider: ProviderKind) -> Result<(), ConfigError> {
        if !self.provider(provider).has_credential() {
            return Err(ConfigError::MissingCredential { provider });
        }
        Ok(())
    }

    /// Resolve a provider name (or the default when `None`) and validate it.
    pub fn validate_named(&self, name: Option<&str>) -> Result<ProviderKind, ConfigError> {
        let provider = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.parse()?,
            None => self.default_provider,
        };
        self.validate(provider)?;
        Ok(provider)
    }

    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            ai_provider: self.default_provider.to_string(),
            has_gemini_key: self.gemini.has_credential(),
            has_freepik_key: self.freepik.has_credential(),
            output_dir: self.output_dir.clone(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.default_provider, ProviderKind::Gemini);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini.base_endpoint, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.freepik.base_endpoint, DEFAULT_FREEPIK_BASE_URL);
        assert_eq!(config.freepik.max_poll_attempts, 30);
        assert_eq!(config.freepik.poll_interval, Duration::from_secs(2));
        assert_eq!(config.output_dir, DEFAULT_OUTPUT_DIR);
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("AI_PROVIDER", "Freepik"),
            ("FREEPIK_API_KEY", "fp-key"),
            ("FREEPIK_BASE_URL", "http://localhost:9000/tasks/"),
            ("FREEPIK_MAX_POLL_ATTEMPTS", "5"),
            ("FREEPIK_POLL_INTERVAL_MS", "250"),
            ("OUTPUT_DIR", "/tmp/out"),
        ]))
        .unwrap();

        assert_eq!(config.default_provider, ProviderKind::Freepik);
        assert_eq!(config.freepik.base_endpoint, "http://localhost:9000/tasks");
        assert_eq!(config.freepik.max_poll_attempts, 5);
        assert_eq!(config.freepik.poll_interval, Duration::from_millis(250));
        assert_eq!(config.output_dir, "/tmp/out");
    }

    #[test]
    fn test_unknown_default_provider_fails_loading() {
        let err = Config::from_lookup(lookup(&[("AI_PROVIDER", "midjourney")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownProvider("midjourney".to_string()));
    }

    #[test]
    fn test_zero_poll_attempts_rejected() {
        let err =
            Config::from_lookup(lookup(&[("FREEPIK_MAX_POLL_ATTEMPTS", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "FREEPIK_MAX_POLL_ATTEMPTS",
                ..
            }
        ));
    }

    #[test]
    fn test_non_numeric_interval_rejected() {
        let err =
            Config::from_lookup(lookup(&[("FREEPIK_POLL_INTERVAL_MS", "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "FREEPIK_POLL_INTERVAL_MS",
                value: "soon".to_string(),
            }
        );
    }

    #[test]
    fn test_validate_reports_missing_credential() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key")])).unwrap();

        assert!(config.validate(ProviderKind::Gemini).is_ok());
        assert_eq!(
            config.validate(ProviderKind::Freepik).unwrap_err(),
            ConfigError::MissingCredential {
                provider: ProviderKind::Freepik
            }
        );
    }

    #[test]
    fn test_whitespace_credential_counts_as_missing() {
        let config = Config::new(
            ProviderKind::Gemini,
            ProviderConfig::new("   ", DEFAULT_GEMINI_BASE_URL),
            ProviderConfig::new("", DEFAULT_FREEPIK_BASE_URL),
        );
        assert!(config.validate(ProviderKind::Gemini).is_err());
    }

    #[test]
    fn test_validate_named_resolves_default_and_rejects_unknown() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key")])).unwrap();

        assert_eq!(config.validate_named(None).unwrap(), ProviderKind::Gemini);
        assert_eq!(
            config.validate_named(Some("GEMINI")).unwrap(),
            ProviderKind::Gemini
        );
        assert_eq!(
            config.validate_named(Some("stability")).unwrap_err(),
            ConfigError::UnknownProvider("stability".to_string())
        );
    }

    #[test]
    fn test_summary_never_contains_secrets() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "super-secret-gemini"),
            ("FREEPIK_API_KEY", "super-secret-freepik"),
        ]))
        .unwrap();

        let summary = config.summary();
        assert_eq!(
            summary,
            ConfigSummary {
                ai_provider: "gemini".to_string(),
                has_gemini_key: true,
                has_freepik_key: true,
                output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            }
        );

        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
