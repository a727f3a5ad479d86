//! Cleanup and decoding of raw model output.
//!
//! Models often wrap JSON in markdown fences or leave a trailing comma
//! before a closing bracket. [`clean_llm_output`] strips both; the parse
//! functions then decode and validate the goal shape. Text inside JSON
//! string literals is never rewritten.

use std::sync::LazyLock;

use regex::Regex;

use crate::goal::Goal;

/// Number of goals a synthesis response must contain.
pub const GOALS_PER_RESPONSE: usize = 3;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*([\s\S]+?)\s*```").expect("fenced block pattern is valid")
});

/// Errors from decoding cleaned model output.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("model output is not valid goal JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected {expected} goals, model returned {found}")]
    WrongCount { expected: usize, found: usize },

    #[error("goal {index} has empty fields: {}", .fields.join(", "))]
    Incomplete {
        index: usize,
        fields: Vec<&'static str>,
    },
}

/// Extract the JSON payload from raw model text.
///
/// 1. If a fenced code block is present (optionally tagged `json`), keep
///    only its interior.
/// 2. Trim surrounding whitespace.
/// 3. Drop commas (outside string literals) that directly precede `]`
///    or `}`, along with the whitespace in between.
///
/// Already-clean JSON passes through unchanged.
pub fn clean_llm_output(text: &str) -> String {
    let inner = FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str());
    strip_trailing_commas(inner.trim())
}

fn strip_trailing_commas(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = json.char_indices();

    while let Some((i, c)) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let tail = &json[i + 1..];
                let after = tail.trim_start();
                if after.starts_with([']', '}']) {
                    let gap = &tail[..tail.len() - after.len()];
                    for _ in gap.chars() {
                        chars.next();
                    }
                } else {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Decode a synthesis response: a JSON array of exactly
/// [`GOALS_PER_RESPONSE`] complete goals.
pub fn parse_goal_list(text: &str) -> Result<Vec<Goal>, ParseError> {
    let cleaned = clean_llm_output(text);
    let goals: Vec<Goal> = serde_json::from_str(&cleaned)?;
    if goals.len() != GOALS_PER_RESPONSE {
        return Err(ParseError::WrongCount {
            expected: GOALS_PER_RESPONSE,
            found: goals.len(),
        });
    }
    for (index, goal) in goals.iter().enumerate() {
        ensure_complete(index, goal)?;
    }
    Ok(goals)
}

/// Decode an update response: a single JSON object with all six fields
/// present and non-empty.
pub fn parse_goal(text: &str) -> Result<Goal, ParseError> {
    let cleaned = clean_llm_output(text);
    let goal: Goal = serde_json::from_str(&cleaned)?;
    ensure_complete(0, &goal)?;
    Ok(goal)
}

fn ensure_complete(index: usize, goal: &Goal) -> Result<(), ParseError> {
    let fields = goal.empty_fields();
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ParseError::Incomplete { index, fields })
    }
}
