//! Batch matching: drives `LlmService::match_one` over many CVs.
//!
//! Flow: pick a `ThrottlePolicy` for the selector → split candidates into
//! consecutive rounds → run each round concurrently and wait for all of it →
//! pause → next round → stable sort by score descending.
//!
//! Every candidate yields exactly one outcome. A call that panics is caught at
//! the round join and reported as an `Unknown` Error outcome.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use tracing::{error, info};

use crate::llm_client::{LlmService, ModelSelector};
use crate::matching::models::{Candidate, MatchOutcome};
use crate::matching::normalize;
use crate::matching::throttle::ThrottlePolicy;

pub struct BatchMatcher {
    llm: Arc<LlmService>,
    pause: Duration,
}

impl BatchMatcher {
    pub fn new(llm: Arc<LlmService>, pause: Duration) -> Self {
        Self { llm, pause }
    }

    pub fn llm(&self) -> &LlmService {
        &self.llm
    }

    pub fn policy_for(&self, selector: &ModelSelector) -> ThrottlePolicy {
        ThrottlePolicy::for_selector(selector, self.pause)
    }

    /// Matches every candidate against `jd_text` and returns outcomes ranked by
    /// score, highest first. Ties keep input order.
    pub async fn batch_match(
        &self,
        candidates: &[Candidate],
        jd_text: &str,
        selector: &ModelSelector,
    ) -> Vec<MatchOutcome> {
        self.run(candidates, jd_text, selector, self.policy_for(selector))
            .await
    }

    async fn run(
        &self,
        candidates: &[Candidate],
        jd_text: &str,
        selector: &ModelSelector,
        policy: ThrottlePolicy,
    ) -> Vec<MatchOutcome> {
        let rounds = policy.rounds(candidates.len());
        let mut outcomes = Vec::with_capacity(candidates.len());

        for (round, chunk) in candidates.chunks(policy.width).enumerate() {
            info!(
                "Processing batch {}/{} with {selector} ({} CVs)",
                round + 1,
                rounds,
                chunk.len()
            );

            let calls = chunk.iter().map(|candidate| {
                AssertUnwindSafe(self.llm.match_one(candidate, jd_text, selector)).catch_unwind()
            });
            let settled = join_all(calls).await;

            for (candidate, result) in chunk.iter().zip(settled) {
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        error!("Matching call for {} panicked: {message}", candidate.name);
                        normalize::unknown_failure(Some(candidate.id), &message)
                    }
                };
                outcomes.push(outcome);
            }

            if round + 1 < rounds && !policy.pause.is_zero() {
                tokio::time::sleep(policy.pause).await;
            }
        }

        rank(&mut outcomes);

        let failed = outcomes.iter().filter(|o| o.is_error()).count();
        info!(
            "Batch matching finished: {} scored, {failed} failed",
            outcomes.len() - failed
        );
        outcomes
    }
}

/// Stable sort, highest score first.
pub fn rank(outcomes: &mut [MatchOutcome]) {
    outcomes.sort_by(|a, b| b.score.cmp(&a.score));
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "matching task panicked".to_string()
    }
}
