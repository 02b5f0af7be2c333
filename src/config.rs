//! Configuration for the research engine.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! keys it changes. API keys can also come from the environment through
//! [`ScoutConfig::apply_env_overrides`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use scout_search::scoring::{ITEM_TRUST_FLOOR, QualityMode};
use scout_search::{ExecuteOptions, SourceConfig};

use crate::error::{Result, ScoutError};
use crate::llm::{CompletionOptions, LlmProvider, ProviderCredentials, ProviderSettings};
use crate::tier::{ComplexityThresholds, TierCeilings};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// LLM providers and their priority.
    pub llm: LlmConfig,
    /// Source credentials, endpoints and web-search priority.
    pub sources: SourceConfig,
    /// Retry and timeout policy for source chains.
    pub retry: RetryConfig,
    /// Last-resort result cache.
    pub cache: CacheConfig,
    /// Daily API budgets.
    pub quota: QuotaConfig,
    /// Research fan-out and ranking.
    pub aggregator: AggregatorConfig,
    /// Complexity thresholds.
    pub complexity: ComplexityThresholds,
    /// Per-plan ceilings.
    pub tiers: TierCeilings,
}

/// LLM provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Providers in the order they are tried.
    pub priority: Vec<LlmProvider>,
    pub openai: ProviderCredentials,
    pub anthropic: ProviderCredentials,
    pub gemini: ProviderCredentials,
    pub groq: ProviderCredentials,
    pub mistral: ProviderCredentials,
    pub openrouter: ProviderCredentials,
    /// How many times invalid JSON output is sent back for repair.
    pub json_repair_attempts: u32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature. Provider default when unset.
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            priority: LlmProvider::ALL.to_vec(),
            openai: ProviderCredentials::default(),
            anthropic: ProviderCredentials::default(),
            gemini: ProviderCredentials::default(),
            groq: ProviderCredentials::default(),
            mistral: ProviderCredentials::default(),
            openrouter: ProviderCredentials::default(),
            json_repair_attempts: 2,
            max_tokens: 4096,
            temperature: None,
        }
    }
}

impl LlmConfig {
    pub fn credentials(&self, provider: LlmProvider) -> &ProviderCredentials {
        match provider {
            LlmProvider::OpenAi => &self.openai,
            LlmProvider::Anthropic => &self.anthropic,
            LlmProvider::Gemini => &self.gemini,
            LlmProvider::Groq => &self.groq,
            LlmProvider::Mistral => &self.mistral,
            LlmProvider::OpenRouter => &self.openrouter,
        }
    }

    pub fn credentials_mut(&mut self, provider: LlmProvider) -> &mut ProviderCredentials {
        match provider {
            LlmProvider::OpenAi => &mut self.openai,
            LlmProvider::Anthropic => &mut self.anthropic,
            LlmProvider::Gemini => &mut self.gemini,
            LlmProvider::Groq => &mut self.groq,
            LlmProvider::Mistral => &mut self.mistral,
            LlmProvider::OpenRouter => &mut self.openrouter,
        }
    }

    /// Providers with an API key, in priority order. Repeated entries are ignored.
    pub fn configured_providers(&self) -> Vec<ProviderSettings> {
        let mut seen = Vec::new();
        self.priority
            .iter()
            .filter(|p| {
                if seen.contains(*p) {
                    false
                } else {
                    seen.push(**p);
                    true
                }
            })
            .filter_map(|p| ProviderSettings::resolve(*p, self.credentials(*p)))
            .collect()
    }
}

/// Retry policy applied to every source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries per operation after the first attempt.
    pub max_retries: u32,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Base backoff delay in milliseconds.
    pub backoff_base_ms: u64,
    /// Double the delay after each failed attempt.
    pub exponential_backoff: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout_ms: 15_000,
            backoff_base_ms: 500,
            exponential_backoff: true,
        }
    }
}

impl RetryConfig {
    pub fn execute_options(&self) -> ExecuteOptions {
        ExecuteOptions::default()
            .with_max_retries(self.max_retries)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_backoff(Duration::from_millis(self.backoff_base_ms), self.exponential_backoff)
    }

    /// Completion options with this retry policy. LLM calls get four times
    /// the source timeout since generation is slower than search.
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            max_retries: self.max_retries,
            timeout: Duration::from_millis(self.timeout_ms.saturating_mul(4)),
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached chain result in seconds.
    pub ttl_secs: u64,
    /// Interval between background sweeps in seconds.
    pub sweep_interval_secs: u64,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 900,
            sweep_interval_secs: 60,
            max_entries: scout_search::fallback::cache::DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// YouTube Data API units per UTC day.
    pub youtube_daily_units: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            youtube_daily_units: scout_search::quota::YOUTUBE_DAILY_UNITS,
        }
    }
}

/// Research fan-out and ranking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Sources queried at the same time.
    pub concurrency: usize,
    /// Pause between batches of sources, in milliseconds.
    pub batch_delay_ms: u64,
    /// Items with a lower trust score are dropped from the merged list.
    pub min_trust: f64,
    /// Formula for per-source quality.
    pub quality_mode: QualityMode,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            batch_delay_ms: 250,
            min_trust: ITEM_TRUST_FLOOR,
            quality_mode: QualityMode::Auto,
        }
    }
}

impl ScoutConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/scout/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scout")
            .join("config.toml")
    }

    /// Fill API keys from the process environment. Set variables win over the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Fill API keys from `lookup`. Blank values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for provider in LlmProvider::ALL {
            if let Some(key) = read(provider.env_var()) {
                tracing::debug!(provider = provider.name(), "API key taken from environment");
                self.llm.credentials_mut(provider).api_key = Some(key);
            }
        }

        let sources = &mut self.sources;
        let slots: [(&str, &mut Option<String>); 6] = [
            ("BRAVE_API_KEY", &mut sources.brave_api_key),
            ("SERPER_API_KEY", &mut sources.serper_api_key),
            ("TAVILY_API_KEY", &mut sources.tavily_api_key),
            ("YOUTUBE_API_KEY", &mut sources.youtube_api_key),
            ("STACKEXCHANGE_KEY", &mut sources.stackexchange_key),
            ("GITHUB_TOKEN", &mut sources.github_token),
        ];
        for (name, slot) in slots {
            if let Some(value) = read(name) {
                tracing::debug!(variable = name, "credential taken from environment");
                *slot = Some(value);
            }
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.sources
            .validate()
            .map_err(|e| ScoutError::Config(format!("sources: {e}")))?;

        for provider in LlmProvider::ALL {
            if let Some(base_url) = &self.llm.credentials(provider).base_url
                && url::Url::parse(base_url).is_err()
            {
                return Err(ScoutError::Config(format!(
                    "llm.{provider}.base_url is not a valid URL: {base_url}"
                )));
            }
        }

        let checks: [(bool, &str); 7] = [
            (self.retry.timeout_ms > 0, "retry.timeout_ms must be greater than 0"),
            (self.cache.ttl_secs > 0, "cache.ttl_secs must be greater than 0"),
            (self.cache.sweep_interval_secs > 0, "cache.sweep_interval_secs must be greater than 0"),
            (self.aggregator.concurrency > 0, "aggregator.concurrency must be greater than 0"),
            (
                (0.0..=1.0).contains(&self.aggregator.min_trust),
                "aggregator.min_trust must be within [0, 1]",
            ),
            (
                self.complexity.medium_pages <= self.complexity.large_pages,
                "complexity.medium_pages must not exceed complexity.large_pages",
            ),
            (self.llm.max_tokens > 0, "llm.max_tokens must be greater than 0"),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(ScoutError::Config((*message).to_string())),
            None => Ok(()),
        }
    }
}
