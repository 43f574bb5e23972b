//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use upskill_core::service::QuizServiceConfig;
use upskill_core::traits::QuestionGenerator;

use crate::gemini::GeminiProvider;
use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single model provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    /// Offline provider; answers every prompt with `response` or a built-in quiz.
    Mock {
        #[serde(default)]
        response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Mock { response } => f
                .debug_struct("Mock")
                .field("response", &response.as_ref().map(|r| r.len()))
                .finish(),
        }
    }
}

/// Top-level upskill configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpskillConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used when `--model` names none.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Questions requested per generation.
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Max retries on provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Location of the JSON quiz store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}
fn default_question_count() -> usize {
    upskill_core::prompt::DEFAULT_QUESTION_COUNT
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./upskill-data/store.json")
}

impl Default for UpskillConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            question_count: default_question_count(),
            default_temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            store_path: default_store_path(),
        }
    }
}

impl UpskillConfig {
    /// Split a `provider/model` spec, falling back to the configured defaults.
    ///
    /// A bare model name uses the default provider.
    pub fn resolve_model(&self, spec: Option<&str>) -> (String, String) {
        match spec {
            Some(s) => match s.split_once('/') {
                Some((provider, model)) => (provider.to_string(), model.to_string()),
                None => (self.default_provider.clone(), s.to_string()),
            },
            None => (self.default_provider.clone(), self.default_model.clone()),
        }
    }

    /// Build the quiz service settings for the given model.
    pub fn service_config(&self, model: &str) -> QuizServiceConfig {
        QuizServiceConfig {
            model: model.to_string(),
            question_count: self.question_count,
            temperature: self.default_temperature,
            max_tokens: self.max_tokens,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            system_prompt_override: None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Mock { response } => ProviderConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `upskill.toml` in the current directory
/// 2. `~/.config/upskill/config.toml`
///
/// Environment variable overrides: `UPSKILL_GEMINI_KEY`, `UPSKILL_OPENAI_KEY`.
pub fn load_config() -> Result<UpskillConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<UpskillConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("upskill.toml");
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
            toml::from_str::<UpskillConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => UpskillConfig::default(),
    };

    if let Ok(key) = std::env::var("UPSKILL_GEMINI_KEY") {
        let entry = config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::Gemini { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("UPSKILL_OPENAI_KEY") {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("upskill"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn QuestionGenerator>> {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => {
            anyhow::ensure!(
                !api_key.trim().is_empty(),
                "no API key configured for provider '{name}' (set UPSKILL_GEMINI_KEY)"
            );
            Ok(Box::new(GeminiProvider::new(api_key, base_url.clone())))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            anyhow::ensure!(
                !api_key.trim().is_empty(),
                "no API key configured for provider '{name}' (set UPSKILL_OPENAI_KEY)"
            );
            Ok(Box::new(OpenAiProvider::new(
                api_key,
                base_url.clone(),
                org_id.clone(),
            )))
        }
        ProviderConfig::Mock { response } => Ok(Box::new(match response {
            Some(r) => MockProvider::with_fixed_response(r),
            None => MockProvider::default(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_UPSKILL_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_UPSKILL_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_UPSKILL_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_UPSKILL_TEST_VAR");
    }

    #[test]
    fn unterminated_reference_left_alone() {
        assert_eq!(resolve_env_vars("abc${OPEN"), "abc${OPEN");
    }

    #[test]
    fn default_config() {
        let config = UpskillConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.question_count, 3);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.store_path, PathBuf::from("./upskill-data/store.json"));
    }

    #[test]
    fn parse_provider_config() {
        let toml_str = r#"
default_provider = "openai"
default_model = "gpt-4.1-mini"
question_count = 5

[providers.gemini]
type = "gemini"
api_key = "g-test"

[providers.openai]
type = "openai"
api_key = "sk-openai"
org_id = "org-1"

[providers.offline]
type = "mock"
"#;
        let config: UpskillConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.question_count, 5);
        assert_eq!(config.default_temperature, 0.7);
        assert!(matches!(
            config.providers.get("offline"),
            Some(ProviderConfig::Mock { response: None })
        ));
    }

    #[test]
    fn debug_masks_keys() {
        let config = ProviderConfig::Gemini {
            api_key: "super-secret".into(),
            base_url: None,
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn load_from_explicit_path_resolves_env_refs() {
        std::env::set_var("_UPSKILL_CFG_KEY", "from-env");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upskill.toml");
        std::fs::write(
            &path,
            "[providers.openai]\ntype = \"openai\"\napi_key = \"${_UPSKILL_CFG_KEY}\"\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        match config.providers.get("openai") {
            Some(ProviderConfig::OpenAI { api_key, .. }) => assert_eq!(api_key, "from-env"),
            other => panic!("unexpected provider config: {other:?}"),
        }
        std::env::remove_var("_UPSKILL_CFG_KEY");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/upskill.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn resolve_model_spec() {
        let config = UpskillConfig::default();
        assert_eq!(
            config.resolve_model(Some("openai/gpt-4.1")),
            ("openai".to_string(), "gpt-4.1".to_string())
        );
        assert_eq!(
            config.resolve_model(Some("gemini-1.5-flash")),
            ("gemini".to_string(), "gemini-1.5-flash".to_string())
        );
        assert_eq!(
            config.resolve_model(None),
            ("gemini".to_string(), "gemini-1.5-pro".to_string())
        );
    }

    #[test]
    fn service_config_carries_settings() {
        let config = UpskillConfig {
            retry_delay_ms: 250,
            question_count: 4,
            ..UpskillConfig::default()
        };
        let service = config.service_config("mock-model");
        assert_eq!(service.model, "mock-model");
        assert_eq!(service.question_count, 4);
        assert_eq!(service.retry_delay, Duration::from_millis(250));
    }

    #[test]
    fn empty_key_rejected() {
        let config = ProviderConfig::Gemini {
            api_key: String::new(),
            base_url: None,
        };
        let err = create_provider("gemini", &config).err().unwrap();
        assert!(err.to_string().contains("UPSKILL_GEMINI_KEY"));
    }

    #[test]
    fn mock_provider_created() {
        let provider = create_provider(
            "offline",
            &ProviderConfig::Mock {
                response: Some("x".into()),
            },
        )
        .unwrap();
        assert_eq!(provider.name(), "mock");
    }
}
