use std::time::Duration;

use brick_core::fallback::{DEFAULT_MODEL, DEFAULT_PERSONA, FallbackSettings};
use chrono_tz::Tz;
use url::Url;

pub const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_FALLBACK_THRESHOLD: f64 = 0.3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Completion service settings for the fallback path.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Missing key is allowed; fallback replies then degrade to the apology.
    pub api_key: Option<String>,
    pub endpoint: Url,
    pub settings: FallbackSettings,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub timezone: Tz,
    /// Intent confidence below this routes the turn to the fallback handler.
    pub fallback_threshold: f64,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = parse_or("PORT", get("PORT"), 3000u16)?;

        let cors_origins = get("BRICK_CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let timezone = match get("BRICK_TIMEZONE") {
            Some(name) => name.parse::<Tz>().map_err(|reason| ConfigError::Invalid {
                var: "BRICK_TIMEZONE",
                value: name.clone(),
                reason: reason.to_string(),
            })?,
            None => Tz::UTC,
        };

        let fallback_threshold = parse_or(
            "BRICK_FALLBACK_THRESHOLD",
            get("BRICK_FALLBACK_THRESHOLD"),
            DEFAULT_FALLBACK_THRESHOLD,
        )?;
        if !(0.0..=1.0).contains(&fallback_threshold) {
            return Err(ConfigError::Invalid {
                var: "BRICK_FALLBACK_THRESHOLD",
                value: fallback_threshold.to_string(),
                reason: "must be between 0 and 1".to_string(),
            });
        }

        let endpoint_raw = get("BRICK_LLM_URL").unwrap_or_else(|| DEFAULT_LLM_URL.to_string());
        let endpoint = Url::parse(&endpoint_raw).map_err(|err| ConfigError::Invalid {
            var: "BRICK_LLM_URL",
            value: endpoint_raw.clone(),
            reason: err.to_string(),
        })?;

        let defaults = FallbackSettings::default();
        let settings = FallbackSettings {
            model: get("BRICK_LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_or("BRICK_LLM_TEMPERATURE", get("BRICK_LLM_TEMPERATURE"), defaults.temperature)?,
            max_tokens: parse_or("BRICK_LLM_MAX_TOKENS", get("BRICK_LLM_MAX_TOKENS"), defaults.max_tokens)?,
            timeout: Duration::from_secs(parse_or(
                "BRICK_LLM_TIMEOUT_SECS",
                get("BRICK_LLM_TIMEOUT_SECS"),
                defaults.timeout.as_secs(),
            )?),
            persona_template: get("BRICK_PERSONA").unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
        };

        Ok(Self {
            port,
            cors_origins,
            timezone,
            fallback_threshold,
            llm: LlmConfig {
                api_key: get("OPENAI_API_KEY"),
                endpoint,
                settings,
            },
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().map_err(|err: T::Err| ConfigError::Invalid {
            var,
            reason: err.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]).expect("defaults are valid");
        assert_eq!(config.port, 3000);
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.fallback_threshold, DEFAULT_FALLBACK_THRESHOLD);
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.llm.endpoint.as_str(), DEFAULT_LLM_URL);
        assert_eq!(config.llm.settings.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.settings.max_tokens, 150);
        assert_eq!(config.llm.settings.timeout, Duration::from_secs(10));
        assert_eq!(config.cors_origins, ["http://localhost:5173"]);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("BRICK_TIMEZONE", "Europe/Lisbon"),
            ("BRICK_FALLBACK_THRESHOLD", "0.55"),
            ("OPENAI_API_KEY", " sk-test "),
            ("BRICK_LLM_MODEL", "gpt-4o-mini"),
            ("BRICK_LLM_TIMEOUT_SECS", "3"),
            ("BRICK_CORS_ORIGINS", "https://brick.example, ,https://admin.brick.example"),
        ])
        .expect("valid overrides");
        assert_eq!(config.port, 8080);
        assert_eq!(config.timezone, chrono_tz::Europe::Lisbon);
        assert_eq!(config.fallback_threshold, 0.55);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.settings.model, "gpt-4o-mini");
        assert_eq!(config.llm.settings.timeout, Duration::from_secs(3));
        assert_eq!(
            config.cors_origins,
            ["https://brick.example", "https://admin.brick.example"]
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            config(&[("BRICK_TIMEZONE", "Mars/Olympus")]),
            Err(ConfigError::Invalid { var: "BRICK_TIMEZONE", .. })
        ));
        assert!(matches!(
            config(&[("BRICK_FALLBACK_THRESHOLD", "1.5")]),
            Err(ConfigError::Invalid { var: "BRICK_FALLBACK_THRESHOLD", .. })
        ));
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("BRICK_LLM_URL", "not a url")]),
            Err(ConfigError::Invalid { var: "BRICK_LLM_URL", .. })
        ));
    }
}
