//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use weles_core::{TagMatch, WelesError, WelesResult};

/// Default server address.
pub const DEFAULT_BASE_URL: &str = "http://192.168.137.64";

pub const ENV_URL: &str = "WELES_URL";
pub const ENV_WORK_DIR: &str = "WELES_WORK_DIR";
pub const ENV_TIMEOUT_MS: &str = "WELES_TIMEOUT_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "WELES_CONNECT_TIMEOUT_MS";

/// Which prediction endpoint to call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionType {
    /// Predicted labels or values.
    #[default]
    Exact,
    /// Class probabilities.
    Prob,
}

impl PredictionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionType::Exact => "exact",
            PredictionType::Prob => "prob",
        }
    }
}

impl FromStr for PredictionType {
    type Err = WelesError;

    fn from_str(s: &str) -> WelesResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(PredictionType::Exact),
            "prob" => Ok(PredictionType::Prob),
            other => Err(WelesError::invalid(format!(
                "prediction type must be 'exact' or 'prob', got '{}'",
                other
            ))),
        }
    }
}

/// Registry client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the weles server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory temporary artifacts are written to.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Overall request timeout in milliseconds. `None` leaves the agent default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Connect timeout in milliseconds.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// Reorder and rename prediction input columns to match the model.
    #[serde(default = "default_prepare_columns")]
    pub prepare_columns: bool,

    #[serde(default)]
    pub prediction_type: PredictionType,

    /// Tag combination used by searches that do not pick one.
    #[serde(default)]
    pub tag_match: TagMatch,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_prepare_columns() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            work_dir: default_work_dir(),
            timeout_ms: None,
            connect_timeout_ms: None,
            prepare_columns: default_prepare_columns(),
            prediction_type: PredictionType::default(),
            tag_match: TagMatch::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `WELES_URL`, `WELES_WORK_DIR`,
    /// `WELES_TIMEOUT_MS` and `WELES_CONNECT_TIMEOUT_MS` when set.
    pub fn from_env() -> WelesResult<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    fn with_env_overrides<F>(mut self, lookup: F) -> WelesResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(dir) = lookup(ENV_WORK_DIR).filter(|v| !v.is_empty()) {
            self.work_dir = PathBuf::from(dir);
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = Some(parse_millis(ENV_TIMEOUT_MS, &ms)?);
        }
        if let Some(ms) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            self.connect_timeout_ms = Some(parse_millis(ENV_CONNECT_TIMEOUT_MS, &ms)?);
        }
        Ok(self)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_prepare_columns(mut self, prepare: bool) -> Self {
        self.prepare_columns = prepare;
        self
    }

    pub fn with_prediction_type(mut self, prediction_type: PredictionType) -> Self {
        self.prediction_type = prediction_type;
        self
    }

    pub fn with_tag_match(mut self, tag_match: TagMatch) -> Self {
        self.tag_match = tag_match;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_millis(key: &str, value: &str) -> WelesResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| WelesError::invalid(format!("{} must be milliseconds, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.work_dir, PathBuf::from("."));
        assert!(config.prepare_columns);
        assert_eq!(config.prediction_type, PredictionType::Exact);
        assert_eq!(config.tag_match, TagMatch::Any);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_serde_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:5000", "prediction_type": "prob"}"#)
                .unwrap();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.prediction_type, PredictionType::Prob);
        assert!(config.prepare_columns);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_URL, "http://weles.local"),
            (ENV_WORK_DIR, "/tmp/weles"),
            (ENV_TIMEOUT_MS, "2500"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::default()
            .with_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "http://weles.local");
        assert_eq!(config.work_dir, PathBuf::from("/tmp/weles"));
        assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
        assert!(config.connect_timeout().is_none());
    }

    #[test]
    fn test_bad_timeout() {
        let result = ClientConfig::default().with_env_overrides(|k| {
            (k == ENV_CONNECT_TIMEOUT_MS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(WelesError::Validation(_))));
    }

    #[test]
    fn test_prediction_type_parse() {
        assert_eq!("PROB".parse::<PredictionType>().unwrap(), PredictionType::Prob);
        assert!("maybe".parse::<PredictionType>().is_err());
    }
}
