//! Scout: resilient multi-provider research engine.
//!
//! Given a product name, Scout gathers developer-facing material from many
//! third-party sources, scores it for trust and quality, and returns one
//! deduplicated, ranked list.
//!
//! # Architecture
//!
//! - **Fallback executor**: ordered provider chains with timeouts, retries
//!   and a last-resort TTL cache (`scout_search::fallback`)
//! - **Sources**: one chain per source type (`scout_search::sources`)
//! - **LLM chain**: OpenAI, Anthropic, Gemini, Groq, Mistral and OpenRouter
//!   behind one completion call ([`llm`])
//! - **Scoring and merge**: domain trust, content validation and near-duplicate
//!   collapse (`scout_search::scoring`, `scout_search::merge`)
//! - **Tiers**: complexity estimation and plan ceilings ([`tier`])
//! - **Research**: batched fan-out and aggregation ([`research`])

pub mod config;
pub mod error;
pub mod llm;
pub mod research;
pub mod runtime;
pub mod tier;

pub use config::{AggregatorConfig, CacheConfig, LlmConfig, QuotaConfig, RetryConfig, ScoutConfig};
pub use error::{Result, ScoutError};
pub use llm::{Completion, CompletionOptions, LlmClient, LlmProvider, Message, generate_completion};
pub use research::{
    FailedSource, ResearchReport, ResearchRequest, ResearchToggles, perform_comprehensive_research,
};
pub use runtime::ScoutRuntime;
pub use tier::{ComplexityClass, Plan, PopularitySignal, ResolvedLimits, SourceLimits, resolve_limits};

pub use scout_search;
