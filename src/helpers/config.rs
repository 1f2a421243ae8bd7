use std::env;

use chrono_tz::Tz;
use thiserror::Error;

use crate::helpers::device_report::ContentEncoding;
use crate::helpers::sas_url::SasUrl;

pub const SAS_URL_KEY: &str = "DA_STORAGE_SAS_URL";
pub const PORT_KEY: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";
pub const TIMEZONE_KEY: &str = "YGGIO_TIMEZONE";
pub const ENCODING_KEY: &str = "YGGIO_CONTENT_ENCODING";

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} is not valid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug)]
pub struct Config {
    pub sas_url: SasUrl,
    pub port: u16,
    pub timezone: Tz,
    pub encoding: ContentEncoding,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_sas_url = lookup(SAS_URL_KEY)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(SAS_URL_KEY))?;
        let sas_url = SasUrl::parse(raw_sas_url.trim()).map_err(|e| ConfigError::Invalid {
            key: SAS_URL_KEY,
            reason: e.to_string(),
        })?;

        let port = match lookup(PORT_KEY) {
            Some(val) => val.trim().parse().map_err(|_| ConfigError::Invalid {
                key: PORT_KEY,
                reason: format!("custom handler port {:?} is not a number", val),
            })?,
            None => DEFAULT_PORT,
        };

        let timezone = match lookup(TIMEZONE_KEY) {
            Some(val) => val.trim().parse::<Tz>().map_err(|e| ConfigError::Invalid {
                key: TIMEZONE_KEY,
                reason: e.to_string(),
            })?,
            None => Tz::UTC,
        };

        let encoding = match lookup(ENCODING_KEY) {
            Some(val) => val.parse().map_err(|reason| ConfigError::Invalid {
                key: ENCODING_KEY,
                reason,
            })?,
            None => ContentEncoding::default(),
        };

        Ok(Config {
            sas_url,
            port,
            timezone,
            encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const SAS: &str = "https://datavalvet.dfs.core.windows.net/raw?sv=2022-11-02&sig=abc";

    #[test]
    fn defaults_apply_when_only_sas_url_is_set() {
        let config = Config::from_lookup(lookup(&[(SAS_URL_KEY, SAS)])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.encoding, ContentEncoding::Utf8);
        assert_eq!(config.sas_url.container_name, "raw");
    }

    #[test]
    fn reads_optional_settings() {
        let config = Config::from_lookup(lookup(&[
            (SAS_URL_KEY, SAS),
            (PORT_KEY, "7071"),
            (TIMEZONE_KEY, "Europe/Stockholm"),
            (ENCODING_KEY, "ascii"),
        ]))
        .unwrap();

        assert_eq!(config.port, 7071);
        assert_eq!(config.timezone, chrono_tz::Europe::Stockholm);
        assert_eq!(config.encoding, ContentEncoding::Ascii);
    }

    #[test]
    fn missing_sas_url_is_an_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(SAS_URL_KEY)));
    }

    #[test]
    fn invalid_values_name_their_key() {
        let err = Config::from_lookup(lookup(&[(SAS_URL_KEY, SAS), (PORT_KEY, "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: PORT_KEY, .. }));

        let err =
            Config::from_lookup(lookup(&[(SAS_URL_KEY, SAS), (TIMEZONE_KEY, "Mars/Olympus")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: TIMEZONE_KEY, .. }));

        let err = Config::from_lookup(lookup(&[(SAS_URL_KEY, "ftp://nope")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: SAS_URL_KEY, .. }));
    }
}
