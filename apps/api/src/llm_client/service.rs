//! `LlmService`: routes categorization and matching to a provider and
//! absorbs every failure into an in-band value.

use std::sync::Arc;

use tracing::{info, warn};

use super::parse::parse_match_reply;
use super::prompts::{
    build_categorize_prompt, build_match_prompt, CATEGORIZE_SYSTEM, MATCH_SYSTEM,
};
use super::{Completion, LlmProvider, ModelSelector, CATEGORIZE_SAMPLING, MATCH_SAMPLING};
use crate::matching::models::{Candidate, MatchOutcome};
use crate::matching::normalize;
use crate::models::document::{Category, DocKind};

/// Built once at startup and shared through `AppState`.
pub struct LlmService {
    hosted: Arc<dyn LlmProvider>,
    self_hosted: Arc<dyn LlmProvider>,
    default_hosted_model: String,
}

impl LlmService {
    pub fn new(
        hosted: Arc<dyn LlmProvider>,
        self_hosted: Arc<dyn LlmProvider>,
        default_hosted_model: impl Into<String>,
    ) -> Self {
        Self {
            hosted,
            self_hosted,
            default_hosted_model: default_hosted_model.into(),
        }
    }

    /// Resolves a client-supplied model token.
    pub fn selector(&self, token: Option<&str>) -> ModelSelector {
        ModelSelector::parse(token, &self.default_hosted_model)
    }

    /// Selector used for intake categorization.
    pub fn default_selector(&self) -> ModelSelector {
        self.selector(None)
    }

    fn route<'a>(&'a self, selector: &'a ModelSelector) -> (&'a dyn LlmProvider, Option<&'a str>) {
        match selector {
            ModelSelector::Hosted { model } => (self.hosted.as_ref(), Some(model.as_str())),
            ModelSelector::SelfHosted => (self.self_hosted.as_ref(), None),
        }
    }

    /// Categorizes a document. Never fails: any error yields `Category::Other`.
    pub async fn categorize(&self, text: &str, kind: DocKind, selector: &ModelSelector) -> Category {
        let (provider, model) = self.route(selector);
        let prompt = build_categorize_prompt(text, kind);
        let request = Completion {
            model,
            system: CATEGORIZE_SYSTEM,
            prompt: &prompt,
            sampling: CATEGORIZE_SAMPLING,
        };

        match provider.complete(&request).await {
            Ok(reply) => {
                let category = Category::from_reply(&reply);
                if category == Category::Other && !reply.trim().eq_ignore_ascii_case("other") {
                    warn!(
                        "Unrecognized category reply from {} ({selector}): {:?}",
                        provider.name(),
                        normalize::truncate_diagnostic(&reply)
                    );
                }
                info!("Categorized {kind} as '{category}' via {}", provider.name());
                category
            }
            Err(e) => {
                warn!("Categorization with {} ({selector}) failed: {e}", provider.name());
                Category::Other
            }
        }
    }

    /// Scores one candidate against a JD. Never fails: any error yields an
    /// Error-tagged outcome carrying a truncated diagnostic.
    pub async fn match_one(
        &self,
        candidate: &Candidate,
        jd_text: &str,
        selector: &ModelSelector,
    ) -> MatchOutcome {
        let (provider, model) = self.route(selector);
        let prompt = build_match_prompt(&candidate.text, jd_text);
        let request = Completion {
            model,
            system: MATCH_SYSTEM,
            prompt: &prompt,
            sampling: MATCH_SAMPLING,
        };
        let context = format!("Error during analysis ({})", provider.name());

        let reply = match provider.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    "Matching {} with {} ({selector}) failed: {e}",
                    candidate.name,
                    provider.name()
                );
                return normalize::failure(candidate, &context, &e.to_string());
            }
        };

        match parse_match_reply(&reply) {
            Ok(map) => normalize::from_reply(candidate, &map),
            Err(e) => {
                warn!(
                    "Unparseable match reply for {} from {}: {e}",
                    candidate.name,
                    provider.name()
                );
                normalize::failure(candidate, &context, &e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::MockProvider;
    use crate::llm_client::ollama::OllamaProvider;
    use crate::llm_client::openai::OpenAiProvider;
    use crate::matching::models::MatchLevel;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;
    use uuid::Uuid;

    fn candidate() -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            name: "alex.pdf".to_string(),
            text: "Senior Rust engineer".to_string(),
        }
    }

    fn service(hosted: Arc<dyn LlmProvider>, self_hosted: Arc<dyn LlmProvider>) -> LlmService {
        LlmService::new(hosted, self_hosted, "gpt-4o-mini")
    }

    #[tokio::test]
    async fn test_categorize_routes_by_selector() {
        let hosted = Arc::new(MockProvider::replying("Legal"));
        let local = Arc::new(MockProvider::replying("Healthcare"));
        let svc = service(hosted.clone(), local.clone());

        let hosted_cat = svc
            .categorize("text", DocKind::Cv, &svc.default_selector())
            .await;
        let local_cat = svc
            .categorize("text", DocKind::Jd, &ModelSelector::SelfHosted)
            .await;

        assert_eq!(hosted_cat, Category::Legal);
        assert_eq!(local_cat, Category::Healthcare);
        assert_eq!(hosted.calls(), 1);
        assert_eq!(local.calls(), 1);
    }

    #[tokio::test]
    async fn test_categorize_failure_is_other() {
        let svc = service(
            Arc::new(MockProvider::failing(503)),
            Arc::new(MockProvider::failing(500)),
        );
        let category = svc
            .categorize("text", DocKind::Cv, &svc.default_selector())
            .await;
        assert_eq!(category, Category::Other);
    }

    #[tokio::test]
    async fn test_categorize_unrecognized_reply_is_other() {
        let svc = service(
            Arc::new(MockProvider::replying("Astronaut Training")),
            Arc::new(MockProvider::replying("Other")),
        );
        let category = svc
            .categorize("text", DocKind::Cv, &svc.default_selector())
            .await;
        assert_eq!(category, Category::Other);
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits_without_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "content": "Legal" } }]
                }));
            })
            .await;
        let hosted = OpenAiProvider::new(server.base_url(), None, "gpt-4o-mini").unwrap();
        let local = Arc::new(MockProvider::replying("Legal"));
        let svc = service(Arc::new(hosted), local.clone());

        let category = svc
            .categorize("text", DocKind::Cv, &svc.default_selector())
            .await;
        let outcome = svc
            .match_one(&candidate(), "JD", &svc.default_selector())
            .await;

        assert_eq!(category, Category::Other);
        assert_eq!(outcome.match_level, MatchLevel::Error);
        assert_eq!(outcome.score, 0);
        assert!(outcome.summary.contains("API key is not configured"));
        mock.assert_hits_async(0).await;
        assert_eq!(local.calls(), 0);
    }

    #[tokio::test]
    async fn test_match_one_forwards_hosted_model_name() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .body_contains("\"model\":\"gpt-4-turbo\"");
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "content": "{\"score\": 88, \"match_level\": \"Excellent\", \"key_matches\": [\"Rust\"], \"gaps\": [], \"summary\": \"strong\"}" } }]
                }));
            })
            .await;
        let hosted =
            OpenAiProvider::new(server.base_url(), Some("sk-test".to_string()), "gpt-4o-mini")
                .unwrap();
        let svc = service(Arc::new(hosted), Arc::new(MockProvider::failing(500)));

        let selector = svc.selector(Some("gpt-4-turbo"));
        let outcome = svc.match_one(&candidate(), "JD", &selector).await;

        mock.assert_async().await;
        assert_eq!(outcome.score, 88);
        assert_eq!(outcome.match_level, MatchLevel::Excellent);
    }

    #[tokio::test]
    async fn test_hosted_non_numeric_score_becomes_neutral() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "content": "{\"score\": \"not a number\", \"match_level\": \"Good\", \"key_matches\": [\"APIs\"], \"gaps\": [\"Go\"], \"summary\": \"decent\"}" } }]
                }));
            })
            .await;
        let hosted =
            OpenAiProvider::new(server.base_url(), Some("sk-test".to_string()), "gpt-4o-mini")
                .unwrap();
        let svc = service(Arc::new(hosted), Arc::new(MockProvider::failing(500)));

        let outcome = svc
            .match_one(&candidate(), "JD", &svc.default_selector())
            .await;

        assert_eq!(outcome.score, 50);
        assert_eq!(outcome.match_level, MatchLevel::Good);
        assert_eq!(outcome.key_matches, vec!["APIs"]);
        assert_eq!(outcome.gaps, vec!["Go"]);
        assert_eq!(outcome.summary, "decent");
    }

    #[tokio::test]
    async fn test_self_hosted_fenced_reply_is_parsed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "Here is the evaluation:\n```json\n{\"score\": 72, \"match_level\": \"Good\", \"key_matches\": [\"X\"], \"gaps\": [], \"summary\": \"ok\"}\n```\nThanks!"
                }));
            })
            .await;
        let local = OllamaProvider::new(server.base_url(), "qwen2.5:32b").unwrap();
        let svc = service(Arc::new(MockProvider::failing(500)), Arc::new(local));

        let c = candidate();
        let outcome = svc.match_one(&c, "JD", &ModelSelector::SelfHosted).await;

        assert_eq!(outcome.score, 72);
        assert_eq!(outcome.match_level, MatchLevel::Good);
        assert_eq!(outcome.key_matches, vec!["X"]);
        assert!(outcome.gaps.is_empty());
        assert_eq!(outcome.summary, "ok");
        assert_eq!(outcome.candidate_id, Some(c.id));
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_clamped() {
        let svc = service(
            Arc::new(MockProvider::replying("{\"score\": 140, \"summary\": \"wow\"}")),
            Arc::new(MockProvider::failing(500)),
        );
        let outcome = svc
            .match_one(&candidate(), "JD", &svc.default_selector())
            .await;
        assert_eq!(outcome.score, 100);
        assert_eq!(outcome.match_level, MatchLevel::Excellent);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_error_outcome() {
        let svc = service(
            Arc::new(MockProvider::replying("I think this candidate is about a 7/10")),
            Arc::new(MockProvider::failing(500)),
        );
        let c = candidate();
        let outcome = svc.match_one(&c, "JD", &svc.default_selector()).await;

        assert_eq!(outcome.match_level, MatchLevel::Error);
        assert_eq!(outcome.score, 0);
        assert!(outcome.key_matches.is_empty());
        assert!(outcome.gaps.is_empty());
        assert!(!outcome.summary.is_empty());
        assert_eq!(outcome.candidate_name, "alex.pdf");
    }

    #[tokio::test]
    async fn test_transport_failure_is_error_outcome() {
        let svc = service(
            Arc::new(MockProvider::failing(502)),
            Arc::new(MockProvider::failing(500)),
        );
        let outcome = svc
            .match_one(&candidate(), "JD", &svc.default_selector())
            .await;
        assert!(outcome.is_error());
        assert!(outcome.summary.starts_with("Error during analysis (mock): "));
        assert!(outcome.summary.contains("502"));
    }

    #[tokio::test]
    async fn test_match_one_is_idempotent_for_deterministic_provider() {
        let svc = service(
            Arc::new(MockProvider::replying(
                "{\"score\": 63.7, \"match_level\": \"good\", \"key_matches\": [\"A\"], \"gaps\": [\"B\"], \"summary\": \"s\"}",
            )),
            Arc::new(MockProvider::failing(500)),
        );
        let c = candidate();
        let first = svc.match_one(&c, "JD", &svc.default_selector()).await;
        let second = svc.match_one(&c, "JD", &svc.default_selector()).await;
        assert_eq!(first, second);
        assert_eq!(first.score, 64);
        assert_eq!(first.match_level, MatchLevel::Good);
    }
}
