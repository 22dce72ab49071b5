//! Application settings and configuration management

use crate::error::{AppError, Result};
use crate::provider::ProviderKind;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
    pub providers: ProvidersConfig,
}

/// Routing and background task configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// End-to-end budget for one request across all fallback attempts
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: u64,
    #[serde(default = "default_health_timeout")]
    pub health_check_timeout_ms: u64,
    /// YAML catalog replacing the built-in one
    #[serde(default)]
    pub catalog_path: Option<String>,
}

fn default_request_timeout() -> u64 {
    300_000
}

fn default_health_check_interval() -> u64 {
    30
}

fn default_health_timeout() -> u64 {
    5_000
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Where a provider's credential comes from
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProviderAuth {
    /// Environment variable holding the key or token
    #[serde(default)]
    pub token_env: Option<String>,
    /// Inline credential, takes precedence over `token_env`
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Transport configuration of one provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub base_url: String,
    /// Environment variable overriding `base_url` when set
    #[serde(default)]
    pub base_url_env: Option<String>,
    #[serde(default)]
    pub auth: ProviderAuth,
    pub timeout_ms: u64,
    pub health_check_path: String,
}

fn default_true() -> bool {
    true
}

impl ProviderConfig {
    /// Defaults for each provider: endpoints, credential variables and timeouts
    pub fn defaults_for(kind: ProviderKind) -> Self {
        let (base_url, base_url_env, token_env, timeout_ms, health_check_path) = match kind {
            ProviderKind::Gemini => (
                "https://generativelanguage.googleapis.com/v1beta",
                None,
                Some("GEMINI_API_KEY"),
                60_000,
                "/models",
            ),
            ProviderKind::HuggingFace => (
                "https://api-inference.huggingface.co",
                None,
                Some("HUGGINGFACE_TOKEN"),
                120_000,
                "/status",
            ),
            ProviderKind::Ollama => (
                "http://localhost:11434",
                Some("OLLAMA_HOST"),
                None,
                300_000,
                "/api/tags",
            ),
            ProviderKind::Stability => (
                "https://api.stability.ai",
                None,
                Some("STABILITY_API_KEY"),
                60_000,
                "/v1/user/account",
            ),
            ProviderKind::LocalVideo => (
                "http://localhost:7860",
                Some("SVD_API_URL"),
                None,
                300_000,
                "/",
            ),
        };

        Self {
            enabled: true,
            base_url: base_url.to_string(),
            base_url_env: base_url_env.map(String::from),
            auth: ProviderAuth {
                token_env: token_env.map(String::from),
                api_key: None,
            },
            timeout_ms,
            health_check_path: health_check_path.to_string(),
        }
    }
}

/// Per-provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    pub gemini: ProviderConfig,
    pub huggingface: ProviderConfig,
    pub ollama: ProviderConfig,
    pub stability: ProviderConfig,
    pub local_video: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::HuggingFace => &self.huggingface,
            ProviderKind::Ollama => &self.ollama,
            ProviderKind::Stability => &self.stability,
            ProviderKind::LocalVideo => &self.local_video,
        }
    }

    pub fn get_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        match kind {
            ProviderKind::Gemini => &mut self.gemini,
            ProviderKind::HuggingFace => &mut self.huggingface,
            ProviderKind::Ollama => &mut self.ollama,
            ProviderKind::Stability => &mut self.stability,
            ProviderKind::LocalVideo => &mut self.local_video,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            gemini: ProviderConfig::defaults_for(ProviderKind::Gemini),
            huggingface: ProviderConfig::defaults_for(ProviderKind::HuggingFace),
            ollama: ProviderConfig::defaults_for(ProviderKind::Ollama),
            stability: ProviderConfig::defaults_for(ProviderKind::Stability),
            local_video: ProviderConfig::defaults_for(ProviderKind::LocalVideo),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/gateway.yaml")
    }

    /// Load settings from a YAML or TOML file, with `GEN_GATEWAY__*` environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let format = if path.extension().map_or(false, |ext| ext == "yaml" || ext == "yml") {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut builder = Config::builder()
            .set_default("gateway.request_timeout_ms", default_request_timeout() as i64)?
            .set_default(
                "gateway.health_check_interval_secs",
                default_health_check_interval() as i64,
            )?
            .set_default("gateway.health_check_timeout_ms", default_health_timeout() as i64)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?;

        for kind in ProviderKind::ALL {
            builder = Self::provider_defaults(builder, kind)?;
        }

        if path.exists() {
            builder = builder.add_source(File::from(path).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix("GEN_GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn provider_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        kind: ProviderKind,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = ProviderConfig::defaults_for(kind);
        let key = |field: &str| format!("providers.{}.{}", kind.config_key(), field);

        let mut builder = builder
            .set_default(key("enabled"), defaults.enabled)?
            .set_default(key("base_url"), defaults.base_url)?
            .set_default(key("timeout_ms"), defaults.timeout_ms as i64)?
            .set_default(key("health_check_path"), defaults.health_check_path)?;

        if let Some(env) = defaults.base_url_env {
            builder = builder.set_default(key("base_url_env"), env)?;
        }
        if let Some(env) = defaults.auth.token_env {
            builder = builder.set_default(key("auth.token_env"), env)?;
        }

        Ok(builder)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.gateway.request_timeout_ms == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "gateway.request_timeout_ms cannot be 0".to_string(),
            )));
        }
        if self.gateway.health_check_interval_secs == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "gateway.health_check_interval_secs cannot be 0".to_string(),
            )));
        }

        for kind in ProviderKind::ALL {
            let provider = self.providers.get(kind);
            if !provider.enabled {
                continue;
            }
            if reqwest::Url::parse(&provider.base_url).is_err() {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "Provider '{}' has an invalid base_url: {}",
                    kind, provider.base_url
                ))));
            }
            if provider.timeout_ms == 0 {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "Provider '{}' timeout_ms cannot be 0",
                    kind
                ))));
            }
        }

        Ok(())
    }

    /// Get enabled provider kinds
    pub fn get_enabled_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.get(*kind).enabled)
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig {
                request_timeout_ms: default_request_timeout(),
                health_check_interval_secs: default_health_check_interval(),
                health_check_timeout_ms: default_health_timeout(),
                catalog_path: None,
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            providers: ProvidersConfig::default(),
        }
    }
}
