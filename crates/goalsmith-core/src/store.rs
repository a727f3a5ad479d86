//! Goal persistence interface.
//!
//! Real storage is an external dependency that has not been chosen yet.
//! [`EchoGoalStore`] stands in for it: it logs and hands the goal back.

use async_trait::async_trait;

use crate::goal::Goal;

/// Persists user-approved goals.
#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Persist a new goal and return the stored form.
    async fn save(&self, goal: Goal) -> anyhow::Result<Goal>;

    /// Persist an edited goal and return the stored form.
    async fn update(&self, goal: Goal) -> anyhow::Result<Goal>;
}

/// Store that writes nothing and returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGoalStore;

#[async_trait]
impl GoalStore for EchoGoalStore {
    async fn save(&self, goal: Goal) -> anyhow::Result<Goal> {
        tracing::info!(title = %goal.title, "save requested; no storage backend configured");
        Ok(goal)
    }

    async fn update(&self, goal: Goal) -> anyhow::Result<Goal> {
        tracing::info!(title = %goal.title, "update requested; no storage backend configured");
        Ok(goal)
    }
}
