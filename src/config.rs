//! Configuration management for health-crew.
//!
//! Configuration is read once at startup from environment variables
//! (after an optional `.env` file has been loaded):
//! - `LOG_LEVEL` - Optional. Default tracing level. Defaults to `info`.
//! - `APP_ENV` - Optional. Environment name. Defaults to `development`.
//! - `OPENAI_API_KEY` - Optional at startup, required for real LLM calls.
//! - `OPENAI_MODEL` - Optional. Defaults to `gpt-4o-mini`.
//! - `OPENAI_BASE_URL` - Optional. Defaults to `https://api.openai.com/v1`.
//! - `LLM_TEMPERATURE` - Optional. Defaults to `0.2`.
//! - `GUIDELINES_API_URL` / `GUIDELINES_API_KEY` - Optional remote guideline service.
//! - `GOOGLE_API_KEY` - Optional. Enables the imaging tools.
//! - `GEMINI_MODEL` - Optional. Defaults to `gemini-1.5-pro-latest`.
//! - `GEMINI_BASE_URL` - Optional. Defaults to the public Generative Language API.
//! - `IMAGE_ROOT` - Optional. Directory the imaging tools may read from. Without
//!   it the HTTP API refuses direct imaging tool calls.
//! - `UMLS_API_KEY`, `RXNORM_API_KEY`, `DRUGBANK_API_KEY`, `FHIR_BASE_URL`,
//!   `SCHEDULER_BASE_URL` - Optional provider credentials. The corresponding
//!   tools stay on their stub data while these are unused.
//! - `MAX_ITERATIONS` - Optional. Agent loop iterations per task. Defaults to `15`.
//! - `VERBOSE` - Optional. Log prompts and stage outputs at info level. Defaults to `true`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8080`.
//! - `CORS_ALLOWED_ORIGINS` - Optional. Comma-separated browser origins allowed
//!   to call the API. Defaults to none (no CORS headers).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Primary LLM provider (OpenAI-compatible chat completions).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key; `None` keeps the client constructible but every call fails upstream
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Base URL without the `/chat/completions` suffix
    pub base_url: String,

    /// Sampling temperature shared by all agents
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.2,
        }
    }
}

/// Vision model used by the imaging tools.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Google API key
    pub api_key: Option<String>,

    /// Gemini model identifier
    pub model: String,

    /// Generative Language API base URL
    pub base_url: String,

    /// Only files under this directory may be sent to the vision model
    pub image_root: Option<PathBuf>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-pro-latest".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_root: None,
        }
    }
}

impl VisionConfig {
    /// Return the API key or fail with a configuration error.
    pub fn require(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("GOOGLE_API_KEY".to_string()))
    }
}

/// Remote clinical guideline service.
#[derive(Debug, Clone, Default)]
pub struct GuidelinesConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

impl GuidelinesConfig {
    /// The remote service is only used when both URL and key are present.
    pub fn remote(&self) -> Option<(&str, &str)> {
        match (self.api_url.as_deref(), self.api_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some((url, key)),
            _ => None,
        }
    }
}

/// Credentials for providers whose tools are still stubbed.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub umls_api_key: Option<String>,
    pub rxnorm_api_key: Option<String>,
    pub drugbank_api_key: Option<String>,
    pub fhir_base_url: Option<String>,
    pub scheduler_base_url: Option<String>,
}

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default tracing level (`LOG_LEVEL`)
    pub log_level: String,

    /// Environment name (`APP_ENV`)
    pub app_env: String,

    pub llm: LlmConfig,

    pub vision: VisionConfig,

    pub guidelines: GuidelinesConfig,

    pub providers: ProviderKeys,

    /// Maximum agent loop iterations per task
    pub max_iterations: usize,

    /// Default verbosity for pipeline runs
    pub verbose: bool,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Browser origins allowed by CORS; empty disables CORS
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            app_env: "development".to_string(),
            llm: LlmConfig::default(),
            vision: VisionConfig::default(),
            guidelines: GuidelinesConfig::default(),
            providers: ProviderKeys::default(),
            max_iterations: 15,
            verbose: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric or boolean variable
    /// cannot be parsed. Missing credentials are not errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        // Blank values count as unset.
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let llm = LlmConfig {
            api_key: var("OPENAI_API_KEY"),
            model: var("OPENAI_MODEL").unwrap_or(defaults.llm.model),
            base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.llm.base_url),
            temperature: var("LLM_TEMPERATURE")
                .map(|v| {
                    v.trim()
                        .parse::<f64>()
                        .map_err(|e| ConfigError::InvalidValue("LLM_TEMPERATURE".to_string(), format!("{}", e)))
                })
                .transpose()?
                .unwrap_or(defaults.llm.temperature),
        };

        let vision = VisionConfig {
            api_key: var("GOOGLE_API_KEY"),
            model: var("GEMINI_MODEL").unwrap_or(defaults.vision.model),
            base_url: var("GEMINI_BASE_URL").unwrap_or(defaults.vision.base_url),
            image_root: var("IMAGE_ROOT").map(PathBuf::from),
        };

        let guidelines = GuidelinesConfig {
            api_url: var("GUIDELINES_API_URL"),
            api_key: var("GUIDELINES_API_KEY"),
        };

        let providers = ProviderKeys {
            umls_api_key: var("UMLS_API_KEY"),
            rxnorm_api_key: var("RXNORM_API_KEY"),
            drugbank_api_key: var("DRUGBANK_API_KEY"),
            fhir_base_url: var("FHIR_BASE_URL"),
            scheduler_base_url: var("SCHEDULER_BASE_URL"),
        };

        let max_iterations = var("MAX_ITERATIONS")
            .map(|v| {
                v.trim()
                    .parse::<usize>()
                    .map_err(|e| ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e)))
            })
            .transpose()?
            .unwrap_or(defaults.max_iterations);

        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let verbose = var("VERBOSE")
            .map(|v| parse_bool(&v).map_err(|e| ConfigError::InvalidValue("VERBOSE".to_string(), e)))
            .transpose()?
            .unwrap_or(defaults.verbose);

        let port = var("PORT")
            .map(|v| {
                v.trim()
                    .parse::<u16>()
                    .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))
            })
            .transpose()?
            .unwrap_or(defaults.port);

        Ok(Self {
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
            app_env: var("APP_ENV").unwrap_or(defaults.app_env),
            llm,
            vision,
            guidelines,
            providers,
            max_iterations,
            verbose,
            host: var("HOST").unwrap_or(defaults.host),
            port,
            cors_origins: var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Tracing filter directive derived from `LOG_LEVEL`.
    pub fn log_filter(&self) -> String {
        let level = self.log_level.trim().to_lowercase();
        let level = match level.as_str() {
            "warning" => "warn",
            "critical" | "fatal" => "error",
            other => other,
        };
        format!("health_crew={level},tower_http={level}")
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.vision.model, "gemini-1.5-pro-latest");
        assert_eq!(config.app_env, "development");
        assert_eq!(config.max_iterations, 15);
        assert!(config.verbose);
        assert!(config.llm.api_key.is_none());
        assert!(config.guidelines.remote().is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("GUIDELINES_API_URL", "http://guidelines.local"),
            ("GUIDELINES_API_KEY", "g-key"),
            ("MAX_ITERATIONS", "4"),
            ("VERBOSE", "off"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(
            config.guidelines.remote(),
            Some(("http://guidelines.local", "g-key"))
        );
        assert_eq!(config.max_iterations, 4);
        assert!(!config.verbose);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn image_root_and_cors_origins_are_opt_in() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.vision.image_root.is_none());
        assert!(config.cors_origins.is_empty());

        let config = Config::from_lookup(lookup_from(&[
            ("IMAGE_ROOT", "/srv/images"),
            (
                "CORS_ALLOWED_ORIGINS",
                "https://clinic.example, ,http://localhost:3000",
            ),
        ]))
        .unwrap();
        assert_eq!(
            config.vision.image_root.as_deref(),
            Some(std::path::Path::new("/srv/images"))
        );
        assert_eq!(
            config.cors_origins,
            vec!["https://clinic.example", "http://localhost:3000"]
        );
    }

    #[test]
    fn guidelines_need_both_url_and_key() {
        let config =
            Config::from_lookup(lookup_from(&[("GUIDELINES_API_URL", "http://guidelines.local")]))
                .unwrap();
        assert!(config.guidelines.remote().is_none());
    }

    #[test]
    fn rejects_malformed_values() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "PORT"));

        let err = Config::from_lookup(lookup_from(&[("VERBOSE", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "VERBOSE"));

        let err = Config::from_lookup(lookup_from(&[("MAX_ITERATIONS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "MAX_ITERATIONS"));
    }

    #[test]
    fn missing_vision_key_is_a_config_error() {
        let vision = VisionConfig::default();
        let err = vision.require().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: GOOGLE_API_KEY"
        );
    }

    #[test]
    fn log_filter_maps_level_aliases() {
        let config = Config {
            log_level: "WARNING".to_string(),
            ..Config::default()
        };
        assert_eq!(config.log_filter(), "health_crew=warn,tower_http=warn");
    }
}
