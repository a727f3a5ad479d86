//! Goal data model and required-field checks.
//!
//! Wire names follow the browser client's camelCase convention
//! (`companyTopBetAlignment`, `framework3E`, `jobTitle`, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six fields every goal must carry, in wire order.
pub const GOAL_FIELDS: [&str; 6] = [
    "title",
    "description",
    "kpi",
    "companyTopBetAlignment",
    "framework3E",
    "coreValue",
];

/// Fields a synthesis request must carry. `managersGoal` is optional.
pub const REQUEST_FIELDS: [&str; 5] = [
    "jobTitle",
    "department",
    "goalDescription",
    "keyResult",
    "dueDate",
];

/// Manager's goal used when the caller does not supply one.
pub const DEFAULT_MANAGERS_GOAL: &str = "Support team objectives and organizational goals";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single SMART goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub title: String,
    pub description: String,
    /// KPI metric followed by the 5-point scoring rubric.
    pub kpi: String,
    #[serde(rename = "companyTopBetAlignment")]
    pub company_top_bet_alignment: String,
    #[serde(rename = "framework3E")]
    pub framework_3e: String,
    #[serde(rename = "coreValue")]
    pub core_value: String,
}

impl Goal {
    /// Names of fields that are empty (after trimming), in wire order.
    pub fn empty_fields(&self) -> Vec<&'static str> {
        let values = [
            &self.title,
            &self.description,
            &self.kpi,
            &self.company_top_bet_alignment,
            &self.framework_3e,
            &self.core_value,
        ];
        GOAL_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    /// True when all six fields are non-empty.
    pub fn is_complete(&self) -> bool {
        self.empty_fields().is_empty()
    }
}

/// Input to one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRequest {
    #[serde(rename = "jobTitle")]
    pub job_title: String,
    pub department: String,
    #[serde(rename = "goalDescription")]
    pub goal_description: String,
    #[serde(rename = "keyResult")]
    pub key_results: String,
    #[serde(rename = "dueDate")]
    pub deadline: String,
    #[serde(rename = "managersGoal", default = "default_managers_goal")]
    pub managers_goal: String,
}

fn default_managers_goal() -> String {
    DEFAULT_MANAGERS_GOAL.to_string()
}

/// An existing goal plus the user's free-text change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub goal: Goal,
    #[serde(default)]
    pub comment: String,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Return the names in `required` that are absent from `body`, or present
/// but not a non-empty string. Order follows `required`.
///
/// A non-object `body` reports every name as missing.
pub fn missing_fields<'a>(body: &Value, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .filter(|name| {
            !matches!(
                body.get(**name),
                Some(Value::String(s)) if !s.trim().is_empty()
            )
        })
        .copied()
        .collect()
}
