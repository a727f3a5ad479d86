//! Shared test utilities for goalsmith integration tests.
//!
//! Provides a scripted [`TextGenerator`] that replays queued responses, and
//! fixture builders for requests, goals and a fast-retry synthesizer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use goalsmith_core::synthesis::{GenerationError, RetryPolicy, TextGenerator};
use goalsmith_core::{Goal, GoalRequest, GoalSynthesizer, PromptCatalog};

/// Generator that replays a fixed script of responses in order.
///
/// Once the script runs out every further call fails, so a test that
/// under-scripts sees the fallback path rather than a hang.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicU32,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failed call.
    pub fn then_error(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    /// A generator whose every call fails.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock poisoned").clone()
    }

    fn push(&self, response: Result<String, String>) {
        self.responses
            .lock()
            .expect("responses lock poisoned")
            .push_back(response);
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompts lock poisoned")
            .push(prompt.to_string());
        let next = self
            .responses
            .lock()
            .expect("responses lock poisoned")
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenerationError::Other(message)),
            None => Err(GenerationError::Other("script exhausted".to_string())),
        }
    }
}

/// A complete goal whose fields all carry `label`.
pub fn sample_goal(label: &str) -> Goal {
    Goal {
        title: format!("{label} title"),
        description: format!("{label} description"),
        kpi: format!("{label} kpi"),
        company_top_bet_alignment: format!("{label} alignment"),
        framework_3e: "ELEVATE".to_string(),
        core_value: "CORE VAL-1".to_string(),
    }
}

/// A goal request for a backend engineer.
pub fn sample_request() -> GoalRequest {
    GoalRequest {
        job_title: "Backend Engineer".to_string(),
        department: "Engineering".to_string(),
        goal_description: "Improve API reliability".to_string(),
        key_results: "p99 latency under 200ms".to_string(),
        deadline: "2025-12-31".to_string(),
        managers_goal: "Ship a stable platform".to_string(),
    }
}

/// The same request as [`sample_request`], in wire form.
pub fn sample_request_json() -> Value {
    json!({
        "jobTitle": "Backend Engineer",
        "department": "Engineering",
        "goalDescription": "Improve API reliability",
        "keyResult": "p99 latency under 200ms",
        "dueDate": "2025-12-31",
        "managersGoal": "Ship a stable platform",
    })
}

/// A JSON array of `n` complete goals, as a model would return it.
pub fn goals_json(n: usize) -> String {
    let goals: Vec<Goal> = (1..=n).map(|i| sample_goal(&format!("goal {i}"))).collect();
    serde_json::to_string(&goals).expect("goals serialize")
}

/// Retry policy with millisecond backoff so exhaustion tests stay fast.
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1))
}

/// A synthesizer over the bundled catalog and `generator`, three attempts,
/// millisecond backoff.
pub fn synthesizer(generator: Arc<ScriptedGenerator>) -> GoalSynthesizer {
    let catalog = PromptCatalog::bundled().expect("bundled catalog parses");
    GoalSynthesizer::new(generator, Arc::new(catalog), fast_policy(3))
}
