//! Pacing policy for batch matching, chosen per provider and model.

use std::time::Duration;

use crate::llm_client::ModelSelector;

/// Self-hosted backends have no request queue of their own.
pub const SELF_HOSTED_WIDTH: usize = 3;
pub const ADVANCED_HOSTED_WIDTH: usize = 4;
pub const DEFAULT_HOSTED_WIDTH: usize = 5;

/// Hosted models that get the narrower batch width.
pub const ADVANCED_HOSTED_MODELS: [&str; 3] = ["gpt-5", "gpt-4o", "gpt-4-turbo"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    /// Calls in flight per round. Always at least 1.
    pub width: usize,
    /// Wait between rounds; not applied after the last one.
    pub pause: Duration,
}

impl ThrottlePolicy {
    pub fn new(width: usize, pause: Duration) -> Self {
        Self {
            width: width.max(1),
            pause,
        }
    }

    pub fn for_selector(selector: &ModelSelector, pause: Duration) -> Self {
        let width = match selector {
            ModelSelector::SelfHosted => SELF_HOSTED_WIDTH,
            ModelSelector::Hosted { model } if ADVANCED_HOSTED_MODELS.contains(&model.as_str()) => {
                ADVANCED_HOSTED_WIDTH
            }
            ModelSelector::Hosted { .. } => DEFAULT_HOSTED_WIDTH,
        };
        Self::new(width, pause)
    }

    /// Number of dispatch rounds for `candidates` inputs.
    pub fn rounds(&self, candidates: usize) -> usize {
        candidates.div_ceil(self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosted(model: &str) -> ModelSelector {
        ModelSelector::Hosted {
            model: model.to_string(),
        }
    }

    #[test]
    fn test_widths_per_selector() {
        let pause = Duration::from_millis(500);
        assert_eq!(
            ThrottlePolicy::for_selector(&ModelSelector::SelfHosted, pause).width,
            3
        );
        for model in ["gpt-5", "gpt-4o", "gpt-4-turbo"] {
            assert_eq!(ThrottlePolicy::for_selector(&hosted(model), pause).width, 4);
        }
        for model in ["gpt-4o-mini", "gpt-3.5-turbo", "gpt-4.1-mini-2025-04-14"] {
            assert_eq!(ThrottlePolicy::for_selector(&hosted(model), pause).width, 5);
        }
    }

    #[test]
    fn test_zero_width_is_raised_to_one() {
        assert_eq!(ThrottlePolicy::new(0, Duration::ZERO).width, 1);
    }

    #[test]
    fn test_rounds_is_ceiling_division() {
        let policy = ThrottlePolicy::new(5, Duration::ZERO);
        assert_eq!(policy.rounds(0), 0);
        assert_eq!(policy.rounds(5), 1);
        assert_eq!(policy.rounds(7), 2);
        assert_eq!(policy.rounds(11), 3);
    }
}
