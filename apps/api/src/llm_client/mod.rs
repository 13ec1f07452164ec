/// LLM Client: the single point of entry for all model calls.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// Handlers and the batch matcher go through `LlmService`, which picks a
/// provider per request and never returns an error: failures degrade to
/// `Category::Other` or an Error-tagged `MatchOutcome`.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

#[cfg(test)]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod parse;
pub mod prompts;
pub mod service;

pub use service::LlmService;

/// Fixed per-request transport timeout. A call exceeding it counts as failed.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Reserved selector token for the self-hosted provider.
pub const SELF_HOSTED_TOKEN: &str = "ollama";
/// Legacy client default; resolves to the configured hosted model.
pub const HOSTED_ALIAS_TOKEN: &str = "openai";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is not configured for {provider}")]
    MissingCredential { provider: &'static str },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected reply shape: {0}")]
    UnexpectedShape(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Sampling knobs for a single call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider to enforce a JSON object reply, where supported.
    pub json_mode: bool,
}

pub const CATEGORIZE_SAMPLING: Sampling = Sampling {
    temperature: 0.3,
    max_tokens: 50,
    json_mode: false,
};

pub const MATCH_SAMPLING: Sampling = Sampling {
    temperature: 0.2,
    max_tokens: 1200,
    json_mode: true,
};

/// A provider-neutral completion request.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    /// `None` means the provider's own configured model.
    pub model: Option<&'a str>,
    pub system: &'a str,
    pub prompt: &'a str,
    pub sampling: Sampling,
}

/// A backend that turns one prompt into one text reply.
///
/// Implementations own their request/response shapes and report every
/// failure as an `LlmError`; they never retry.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    async fn complete(&self, request: &Completion<'_>) -> Result<String, LlmError>;
}

/// Which provider (and model) a request is routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSelector {
    Hosted { model: String },
    SelfHosted,
}

impl ModelSelector {
    /// Resolves a client-supplied token. `"ollama"` selects the self-hosted
    /// provider; an absent token or `"openai"` means the default hosted model;
    /// any other token is forwarded as the hosted model name.
    pub fn parse(token: Option<&str>, default_hosted_model: &str) -> Self {
        let token = token.map(str::trim).unwrap_or_default();
        if token.eq_ignore_ascii_case(SELF_HOSTED_TOKEN) {
            ModelSelector::SelfHosted
        } else if token.is_empty() || token.eq_ignore_ascii_case(HOSTED_ALIAS_TOKEN) {
            ModelSelector::Hosted {
                model: default_hosted_model.to_string(),
            }
        } else {
            ModelSelector::Hosted {
                model: token.to_string(),
            }
        }
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSelector::Hosted { model } => f.write_str(model),
            ModelSelector::SelfHosted => f.write_str(SELF_HOSTED_TOKEN),
        }
    }
}

/// Builds the HTTP client shared by one provider.
pub(crate) fn http_client() -> Result<Client, LlmError> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_reserved_token_is_self_hosted() {
        assert_eq!(
            ModelSelector::parse(Some("ollama"), "gpt-4o-mini"),
            ModelSelector::SelfHosted
        );
        assert_eq!(
            ModelSelector::parse(Some(" Ollama "), "gpt-4o-mini"),
            ModelSelector::SelfHosted
        );
    }

    #[test]
    fn test_selector_defaults_to_hosted_model() {
        let expected = ModelSelector::Hosted {
            model: "gpt-4o-mini".to_string(),
        };
        assert_eq!(ModelSelector::parse(None, "gpt-4o-mini"), expected);
        assert_eq!(ModelSelector::parse(Some(""), "gpt-4o-mini"), expected);
        assert_eq!(ModelSelector::parse(Some("openai"), "gpt-4o-mini"), expected);
    }

    #[test]
    fn test_selector_forwards_other_tokens() {
        assert_eq!(
            ModelSelector::parse(Some("gpt-4-turbo"), "gpt-4o-mini"),
            ModelSelector::Hosted {
                model: "gpt-4-turbo".to_string()
            }
        );
    }

    #[test]
    fn test_selector_display() {
        assert_eq!(ModelSelector::SelfHosted.to_string(), "ollama");
        assert_eq!(
            ModelSelector::Hosted {
                model: "gpt-4o".to_string()
            }
            .to_string(),
            "gpt-4o"
        );
    }
}
