//! Runtime settings for domains.

use serde::{Deserialize, Serialize};

use crate::framework::error::ConfigError;

pub const DEBUG_VAR: &str = "RESOURCE_DOMAIN_DEBUG";
pub const AUTO_COMMIT_VAR: &str = "RESOURCE_DOMAIN_AUTO_COMMIT";

/// Domain settings.
///
/// - `debug`: untranslatable store errors keep their root message.
/// - `auto_commit`: default commit strategy of the batch helpers on
///   [`ResourceSystem`](crate::lifecycle::ResourceSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub auto_commit: bool,
}

impl DomainConfig {
    /// Reads `RESOURCE_DOMAIN_DEBUG` and `RESOURCE_DOMAIN_AUTO_COMMIT`. Unset
    /// variables keep their default (`false`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            debug: parse_flag(DEBUG_VAR, std::env::var(DEBUG_VAR).ok())?,
            auto_commit: parse_flag(AUTO_COMMIT_VAR, std::env::var(AUTO_COMMIT_VAR).ok())?,
        })
    }
}

/// Parses a boolean flag: `true`/`false`/`1`/`0`, case-insensitive.
pub fn parse_flag(var: &str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvValue {
            var: var.to_string(),
            reason: format!("expected true/false/1/0, got \"{}\"", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag(DEBUG_VAR, None).unwrap());
        assert!(parse_flag(DEBUG_VAR, Some("TRUE".into())).unwrap());
        assert!(parse_flag(DEBUG_VAR, Some(" 1 ".into())).unwrap());
        assert!(!parse_flag(DEBUG_VAR, Some("0".into())).unwrap());
    }

    #[test]
    fn test_invalid_flag() {
        let error = parse_flag(AUTO_COMMIT_VAR, Some("yes".into())).unwrap_err();
        assert_eq!(
            error,
            ConfigError::InvalidEnvValue {
                var: AUTO_COMMIT_VAR.to_string(),
                reason: "expected true/false/1/0, got \"yes\"".to_string(),
            }
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: DomainConfig = serde_json::from_str(r#"{ "debug": true }"#).unwrap();
        assert_eq!(
            config,
            DomainConfig {
                debug: true,
                auto_commit: false
            }
        );
    }
}
