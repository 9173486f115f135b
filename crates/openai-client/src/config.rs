//! Configuration for OpenAiClient.

use safety_core::SafetyError;
use std::env;

/// Configuration for OpenAiClient.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Default model for completions.
    pub model: String,

    /// Model used by the moderation endpoint.
    pub moderation_model: String,

    /// Default maximum tokens for a completion.
    pub max_tokens: Option<u32>,

    /// Default temperature (0.0 - 2.0).
    pub temperature: Option<f32>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            moderation_model: "omni-moderation-latest".to_string(),
            max_tokens: Some(2048),
            temperature: Some(0.7),
        }
    }
}

impl OpenAiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENAI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_URL` - API URL (default: https://api.openai.com)
    /// - `OPENAI_MODEL` - Completion model (default: gpt-4o-mini)
    /// - `OPENAI_MODERATION_MODEL` - Moderation model (default: omni-moderation-latest)
    /// - `OPENAI_MAX_TOKENS` - Max tokens (default: 2048)
    /// - `OPENAI_TEMPERATURE` - Temperature (default: 0.7)
    pub fn from_env() -> Result<Self, SafetyError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| SafetyError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        let api_url =
            env::var("OPENAI_API_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());

        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let moderation_model = env::var("OPENAI_MODERATION_MODEL")
            .unwrap_or_else(|_| "omni-moderation-latest".to_string());

        let max_tokens = env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(2048));

        let temperature = env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(0.7));

        Ok(Self {
            api_url,
            api_key,
            model,
            moderation_model,
            max_tokens,
            temperature,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }
}

/// Builder for OpenAiConfig.
#[derive(Debug, Default)]
pub struct OpenAiConfigBuilder {
    config: OpenAiConfig,
}

impl OpenAiConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the completion model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the moderation model.
    pub fn moderation_model(mut self, model: impl Into<String>) -> Self {
        self.config.moderation_model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiConfig::default();

        assert_eq!(config.api_url, "https://api.openai.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.moderation_model, "omni-moderation-latest");
        assert_eq!(config.max_tokens, Some(2048));
        assert_eq!(config.temperature, Some(0.7));
    }

    #[test]
    fn test_builder_all_options() {
        let config = OpenAiConfig::builder()
            .api_key("my-key")
            .api_url("https://llm.internal")
            .model("gpt-4o")
            .moderation_model("text-moderation-stable")
            .max_tokens(512)
            .temperature(0.2)
            .build();

        assert_eq!(config.api_key, "my-key");
        assert_eq!(config.api_url, "https://llm.internal");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.moderation_model, "text-moderation-stable");
        assert_eq!(config.max_tokens, Some(512));
        assert_eq!(config.temperature, Some(0.2));
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_openai_vars() {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("OPENAI_API_URL");
            std::env::remove_var("OPENAI_MODEL");
            std::env::remove_var("OPENAI_MODERATION_MODEL");
            std::env::remove_var("OPENAI_MAX_TOKENS");
            std::env::remove_var("OPENAI_TEMPERATURE");
        }

        // Missing API key should error
        clear_all_openai_vars();
        match OpenAiConfig::from_env() {
            Err(SafetyError::Configuration(msg)) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        // Only API key set, defaults used
        clear_all_openai_vars();
        std::env::set_var("OPENAI_API_KEY", "test-env-key");
        let config = OpenAiConfig::from_env().unwrap();
        assert_eq!(config.api_key, "test-env-key");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, Some(2048));

        // All vars set
        std::env::set_var("OPENAI_API_URL", "https://proxy.test");
        std::env::set_var("OPENAI_MODEL", "gpt-4o");
        std::env::set_var("OPENAI_MODERATION_MODEL", "custom-mod");
        std::env::set_var("OPENAI_MAX_TOKENS", "4096");
        std::env::set_var("OPENAI_TEMPERATURE", "0.3");
        let config = OpenAiConfig::from_env().unwrap();
        assert_eq!(config.api_url, "https://proxy.test");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.moderation_model, "custom-mod");
        assert_eq!(config.max_tokens, Some(4096));
        assert_eq!(config.temperature, Some(0.3));

        // Unparseable numbers fall back to defaults
        std::env::set_var("OPENAI_MAX_TOKENS", "lots");
        let config = OpenAiConfig::from_env().unwrap();
        assert_eq!(config.max_tokens, Some(2048));

        clear_all_openai_vars();
    }
}
