use crate::ai::ModelProvider;
use crate::error::{Result, WorkflowError};
use crate::tools::builtin::goldrush::GOLDRUSH_API_KEY_ENV;
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_MAX_ITERATIONS: usize = 50;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Per-workflow tuning, as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Non-positive or missing falls back to [`DEFAULT_MAX_ITERATIONS`]
    #[serde(rename = "maxIterations", default)]
    pub max_iterations: Option<i64>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Validated [`WorkflowConfig`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkflowSettings {
    pub max_iterations: usize,
    pub temperature: f32,
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, max_iterations: i64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn resolve(&self) -> Result<WorkflowSettings> {
        let temperature = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=1.0).contains(&temperature) {
            return Err(WorkflowError::InvalidTemperature(temperature));
        }

        let max_iterations = match self.max_iterations {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => DEFAULT_MAX_ITERATIONS,
        };

        Ok(WorkflowSettings {
            max_iterations,
            temperature,
        })
    }
}

/// Process configuration for the `zee` binary, read from the environment
#[derive(Clone)]
pub struct Config {
    pub provider: ModelProvider,
    pub api_key: String,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub workflow: WorkflowConfig,
    pub goldrush_api_key: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("workflow", &self.workflow)
            .field("goldrush", &self.goldrush_api_key.is_some())
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. `ZEE_API_KEY` wins over the
    /// provider's own key variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match get("ZEE_PROVIDER") {
            Some(name) => ModelProvider::from_str(&name).ok_or_else(|| {
                WorkflowError::InvalidConfig(format!("unknown provider '{}'", name))
            })?,
            None => ModelProvider::default(),
        };

        let api_key = get("ZEE_API_KEY")
            .or_else(|| get(provider.api_key_env()))
            .ok_or_else(|| {
                WorkflowError::MissingCredential(format!("ZEE_API_KEY or {}", provider.api_key_env()))
            })?;

        Ok(Self {
            provider,
            api_key,
            endpoint: get("ZEE_ENDPOINT"),
            model: get("ZEE_MODEL"),
            max_tokens: parse_number(&get, "ZEE_MAX_TOKENS")?,
            workflow: WorkflowConfig {
                max_iterations: parse_number(&get, "ZEE_MAX_ITERATIONS")?,
                temperature: parse_number(&get, "ZEE_TEMPERATURE")?,
            },
            goldrush_api_key: get(GOLDRUSH_API_KEY_ENV),
        })
    }
}

fn parse_number<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| WorkflowError::InvalidConfig(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_max_iterations_resolution() {
        for (input, expected) in [(None, 50), (Some(0), 50), (Some(-10), 50), (Some(1000), 1000)] {
            let config = WorkflowConfig {
                max_iterations: input,
                temperature: None,
            };
            assert_eq!(config.resolve().unwrap().max_iterations, expected, "{:?}", input);
        }
    }

    #[test]
    fn test_temperature_resolution() {
        assert_eq!(WorkflowConfig::new().resolve().unwrap().temperature, 0.5);
        assert_eq!(WorkflowConfig::new().temperature(0.2).resolve().unwrap().temperature, 0.2);
        assert!(matches!(
            WorkflowConfig::new().temperature(1.5).resolve(),
            Err(WorkflowError::InvalidTemperature(_))
        ));
        assert!(WorkflowConfig::new().temperature(-0.1).resolve().is_err());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("ZEE_PROVIDER", "deepseek"),
            ("DEEPSEEK_API_KEY", "sk-test"),
            ("ZEE_MAX_ITERATIONS", "12"),
            ("ZEE_TEMPERATURE", "0.1"),
            ("GOLDRUSH_API_KEY", "cqt_key"),
        ]))
        .unwrap();

        assert_eq!(config.provider, ModelProvider::DeepSeek);
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.workflow.max_iterations, Some(12));
        assert_eq!(config.workflow.temperature, Some(0.1));
        assert_eq!(config.goldrush_api_key.as_deref(), Some("cqt_key"));
        assert!(config.model.is_none());
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let err = Config::from_lookup(lookup(&[("ZEE_API_KEY", "k"), ("ZEE_MAX_TOKENS", "lots")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: ZEE_MAX_TOKENS must be a number, got 'lots'"
        );
    }

    #[test]
    fn test_workflow_config_json_names() {
        let config: WorkflowConfig =
            serde_json::from_str(r#"{"maxIterations": 7, "temperature": 0.3}"#).unwrap();
        assert_eq!(config.max_iterations, Some(7));
    }
}
