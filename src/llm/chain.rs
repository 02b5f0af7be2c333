//! Completion chain construction.
//!
//! One [`Operation`] per configured provider, in priority order. Providers
//! without an API key are left out; an empty chain is reported by the
//! caller as [`SearchError::ProviderUnavailable`].

use std::sync::Arc;

use scout_search::{Operation, SearchError};

use super::message::Message;
use super::provider::{LlmProvider, ProviderSettings, RequestOptions};
use super::{Completion, anthropic, gemini, openai};

/// Build the completion chain for `providers`.
pub fn build_completion_chain(
    http: &reqwest::Client,
    providers: &[ProviderSettings],
    messages: Arc<Vec<Message>>,
    options: RequestOptions,
) -> Vec<Operation<Completion>> {
    providers
        .iter()
        .map(|settings| {
            let http = http.clone();
            let settings = settings.clone();
            let messages = Arc::clone(&messages);
            Operation::new(settings.provider.name(), move || {
                let http = http.clone();
                let settings = settings.clone();
                let messages = Arc::clone(&messages);
                async move { dispatch(&http, &settings, &messages, &options).await }
            })
        })
        .collect()
}

async fn dispatch(
    http: &reqwest::Client,
    settings: &ProviderSettings,
    messages: &[Message],
    options: &RequestOptions,
) -> Result<Completion, SearchError> {
    if settings.provider.is_openai_compatible() {
        return openai::complete(http, settings, messages, options).await;
    }
    match settings.provider {
        LlmProvider::Anthropic => anthropic::complete(http, settings, messages, options).await,
        _ => gemini::complete(http, settings, messages, options).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ProviderCredentials;

    fn settings(provider: LlmProvider) -> ProviderSettings {
        let creds = ProviderCredentials {
            api_key: Some("k".into()),
            ..Default::default()
        };
        ProviderSettings::resolve(provider, &creds).expect("resolved")
    }

    #[test]
    fn one_operation_per_provider_in_order() {
        let providers = vec![settings(LlmProvider::Gemini), settings(LlmProvider::Groq)];
        let chain = build_completion_chain(
            &reqwest::Client::new(),
            &providers,
            Arc::new(vec![Message::user("hi")]),
            RequestOptions::default(),
        );
        let labels: Vec<&str> = chain.iter().map(|op| op.label()).collect();
        assert_eq!(labels, vec!["gemini", "groq"]);
    }

    #[test]
    fn no_providers_no_operations() {
        let chain = build_completion_chain(
            &reqwest::Client::new(),
            &[],
            Arc::new(Vec::new()),
            RequestOptions::default(),
        );
        assert!(chain.is_empty());
    }
}
