//! Goal synthesis: prompt construction, model invocation with retry,
//! response cleanup and validation, and deterministic fallbacks.
//!
//! # Flow
//!
//! ```text
//! GoalRequest --build_context--> render_synthesis_prompt
//!     |
//!     v
//! run_with_retry( TextGenerator::generate --> parse_goal_list )
//!     |                                    |
//!     | Parsed                             | Exhausted
//!     v                                    v
//! Synthesized::Generated(goals)     Synthesized::Fallback(fallback_goals)
//! ```
//!
//! Goal updates follow the same shape with `render_update_prompt`,
//! `parse_goal` and `fallback_update`.

pub mod fallback;
pub mod gemini;
pub mod generator;
pub mod prompt;
pub mod retry;
pub mod sanitize;

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::PromptCatalog;
use crate::goal::{Goal, GoalRequest, UpdateRequest};

pub use fallback::{fallback_goals, fallback_update};
pub use gemini::{GeminiConfig, GeminiGenerator};
pub use generator::{GenerationError, TextGenerator};
pub use retry::{AttemptOutcome, RetryOutcome, RetryPolicy, run_with_retry};
pub use sanitize::{ParseError, clean_llm_output, parse_goal, parse_goal_list};

/// Where a pipeline result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Generated,
    Fallback,
}

/// A pipeline result. Both variants satisfy the goal invariants; the
/// variant only records whether the model produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesized<T> {
    Generated { value: T, attempts: u32 },
    Fallback { value: T, attempts: u32, reason: String },
}

impl<T> Synthesized<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Generated { value, .. } | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Generated { value, .. } | Self::Fallback { value, .. } => value,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Generated { attempts, .. } | Self::Fallback { attempts, .. } => *attempts,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Self::Generated { .. } => Source::Generated,
            Self::Fallback { .. } => Source::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Turns goal requests into goals using a hosted model.
///
/// Built once at startup and shared behind an `Arc`; holds no mutable state.
pub struct GoalSynthesizer {
    generator: Arc<dyn TextGenerator>,
    catalog: Arc<PromptCatalog>,
    policy: RetryPolicy,
}

impl GoalSynthesizer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<PromptCatalog>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            catalog,
            policy,
        }
    }

    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Produce exactly three goals for `request`.
    ///
    /// Never fails: when every attempt fails the template goals from
    /// [`fallback_goals`] are returned instead.
    pub async fn generate_goals(&self, request: &GoalRequest) -> Synthesized<Vec<Goal>> {
        tracing::info!(
            job_title = %request.job_title,
            department = %request.department,
            "generating goals"
        );

        let generator = self.generator.as_ref();
        let catalog = self.catalog.as_ref();

        let outcome = run_with_retry(&self.policy, move |_| async move {
            let context = prompt::build_context(request, catalog);
            let rendered = prompt::render_synthesis_prompt(&context);
            match generator.generate(&rendered).await {
                Ok(text) => {
                    tracing::debug!(output = %text, "model output");
                    match parse_goal_list(&text) {
                        Ok(goals) => AttemptOutcome::Parsed(goals),
                        Err(e) => AttemptOutcome::Retryable(e.to_string()),
                    }
                }
                Err(e) => AttemptOutcome::Retryable(e.to_string()),
            }
        })
        .await;

        match outcome {
            RetryOutcome::Parsed { value, attempts } => Synthesized::Generated { value, attempts },
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                tracing::warn!(attempts, "goal generation exhausted retries; using fallback goals");
                Synthesized::Fallback {
                    value: fallback_goals(request),
                    attempts,
                    reason: last_error,
                }
            }
        }
    }

    /// Revise one goal according to the user's comment.
    ///
    /// Never fails: when every attempt fails the goal is returned with the
    /// cosmetic edit from [`fallback_update`].
    pub async fn update_goal(&self, request: &UpdateRequest) -> Synthesized<Goal> {
        tracing::info!(title = %request.goal.title, "updating goal");

        let generator = self.generator.as_ref();
        let catalog = self.catalog.as_ref();

        let outcome = run_with_retry(&self.policy, move |_| async move {
            let rendered = prompt::render_update_prompt(&request.goal, &request.comment, catalog);
            match generator.generate(&rendered).await {
                Ok(text) => {
                    tracing::debug!(output = %text, "model update output");
                    match parse_goal(&text) {
                        Ok(goal) => AttemptOutcome::Parsed(goal),
                        Err(e) => AttemptOutcome::Retryable(e.to_string()),
                    }
                }
                Err(e) => AttemptOutcome::Retryable(e.to_string()),
            }
        })
        .await;

        match outcome {
            RetryOutcome::Parsed { value, attempts } => {
                tracing::info!(title = %value.title, attempts, "goal updated");
                Synthesized::Generated { value, attempts }
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                tracing::warn!(attempts, "goal update exhausted retries; applying fallback edit");
                let today = chrono::Local::now().date_naive();
                Synthesized::Fallback {
                    value: fallback_update(&request.goal, &request.comment, today),
                    attempts,
                    reason: last_error,
                }
            }
        }
    }
}
