//! Runtime settings for the model endpoint and automation timeouts.
//!
//! Everything the research and discovery engines need is threaded through
//! this value explicitly; there is no process-wide mutable state.

use std::time::Duration;

/// Settings for model calls and page waits
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the Ollama daemon
    pub ollama_host: String,

    /// Model name passed to the generate endpoint
    pub ollama_model: String,

    /// Maximum tokens per generation
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Timeout for a single model request
    pub request_timeout: Duration,

    /// Ceiling on waiting for a page to settle after navigation or a click
    pub page_load_timeout: Duration,

    /// Launch the browser headless
    pub headless: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_host: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1:latest".to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            request_timeout: Duration::from_secs(120),
            page_load_timeout: Duration::from_secs(30),
            headless: true,
        }
    }
}

impl Settings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from the environment, falling back to defaults.
    ///
    /// Recognized variables: `OLLAMA_HOST`, `OLLAMA_MODEL`, `MAX_TOKENS`,
    /// `TEMPERATURE`, `TIMEOUT_SECONDS`, `PAGE_LOAD_TIMEOUT_SECONDS`.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            settings.ollama_host = host.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            settings.ollama_model = model;
        }
        if let Some(max_tokens) = env_parse("MAX_TOKENS") {
            settings.max_tokens = max_tokens;
        }
        if let Some(temperature) = env_parse("TEMPERATURE") {
            settings.temperature = temperature;
        }
        if let Some(secs) = env_parse("TIMEOUT_SECONDS") {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse("PAGE_LOAD_TIMEOUT_SECONDS") {
            settings.page_load_timeout = Duration::from_secs(secs);
        }

        settings
    }

    /// Builder method: set the Ollama host
    pub fn ollama_host(mut self, host: impl Into<String>) -> Self {
        self.ollama_host = host.into();
        self
    }

    /// Builder method: set the model name
    pub fn ollama_model(mut self, model: impl Into<String>) -> Self {
        self.ollama_model = model.into();
        self
    }

    /// Builder method: set the page-load wait ceiling
    pub fn page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
