//! Deterministic substitutes used when the model cannot produce a usable
//! answer within the retry budget.

use chrono::NaiveDate;

use crate::goal::{Goal, GoalRequest};

/// Longest comment excerpt appended by [`fallback_update`], in characters.
pub const COMMENT_EXCERPT_CHARS: usize = 100;

/// Three template goals built only from the caller's own fields.
pub fn fallback_goals(request: &GoalRequest) -> Vec<Goal> {
    let GoalRequest {
        job_title,
        department,
        goal_description,
        key_results,
        deadline,
        ..
    } = request;

    vec![
        Goal {
            title: "Achieve Primary Objective Through Strategic Planning".to_string(),
            description: format!(
                "Develop and execute a plan to {} by {deadline}, focusing on {key_results}.",
                goal_description.to_lowercase()
            ),
            kpi: format!("100% completion of planned milestones by {deadline}"),
            company_top_bet_alignment: "INVESTING FOR SCALE".to_string(),
            framework_3e: "ELEVATE".to_string(),
            core_value: "CORE VAL-4".to_string(),
        },
        Goal {
            title: "Enhance Team Collaboration".to_string(),
            description: format!(
                "Foster collaboration in {department} to achieve {goal_description} by {deadline}."
            ),
            kpi: "90% team participation in initiatives".to_string(),
            company_top_bet_alignment: "EMPLOYEE DEVELOPMENT FOCUS".to_string(),
            framework_3e: "EXTEND".to_string(),
            core_value: "CORE VAL-3".to_string(),
        },
        Goal {
            title: "Implement Innovation and Improvement".to_string(),
            description: format!(
                "Drive innovation in {department} as {job_title} to deliver {key_results} by {deadline}."
            ),
            kpi: "Implementation of 3 improvements".to_string(),
            company_top_bet_alignment: "TRANSFORMING INTO AN AI COMPANY".to_string(),
            framework_3e: "EXPAND".to_string(),
            core_value: "CORE VAL-2".to_string(),
        },
    ]
}

/// Mark `goal` as edited without model help.
///
/// Appends an excerpt of `comment` (first [`COMMENT_EXCERPT_CHARS`]
/// characters, then `...` if cut) to the description and a `MM/DD` date tag
/// to the title. All other fields are copied unchanged.
pub fn fallback_update(goal: &Goal, comment: &str, today: NaiveDate) -> Goal {
    let excerpt = if comment.chars().count() > COMMENT_EXCERPT_CHARS {
        let cut: String = comment.chars().take(COMMENT_EXCERPT_CHARS).collect();
        format!("{cut}...")
    } else {
        comment.to_string()
    };

    Goal {
        title: format!("{} (Modified {})", goal.title, today.format("%m/%d")),
        description: format!(
            "{} (Updated based on feedback: {excerpt})",
            goal.description
        ),
        ..goal.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GoalRequest {
        GoalRequest {
            job_title: "Support Lead".to_string(),
            department: "Customer Support".to_string(),
            goal_description: "Improve First Response Time".to_string(),
            key_results: "respond within 2 hours".to_string(),
            deadline: "June 2025".to_string(),
            managers_goal: "Delight customers".to_string(),
        }
    }

    fn goal() -> Goal {
        fallback_goals(&request()).remove(0)
    }

    #[test]
    fn fallback_goals_are_three_complete_goals() {
        let goals = fallback_goals(&request());
        assert_eq!(goals.len(), 3);
        assert!(goals.iter().all(Goal::is_complete));
    }

    #[test]
    fn fallback_goals_interpolate_request_fields() {
        let goals = fallback_goals(&request());
        assert_eq!(
            goals[0].description,
            "Develop and execute a plan to improve first response time by June 2025, \
             focusing on respond within 2 hours."
        );
        assert_eq!(
            goals[0].kpi,
            "100% completion of planned milestones by June 2025"
        );
        assert!(goals[1].description.contains("in Customer Support"));
        assert!(goals[2].description.contains("as Support Lead"));
    }

    #[test]
    fn fallback_goals_survive_json_round_trip() {
        let goals = fallback_goals(&request());
        let json = serde_json::to_string(&goals).unwrap();
        let parsed: Vec<Goal> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, goals);
    }

    #[test]
    fn fallback_goals_are_deterministic() {
        assert_eq!(fallback_goals(&request()), fallback_goals(&request()));
    }

    #[test]
    fn update_appends_comment_and_date() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let updated = fallback_update(&goal(), "tighten the deadline", today);

        assert_eq!(
            updated.title,
            "Achieve Primary Objective Through Strategic Planning (Modified 03/07)"
        );
        assert!(
            updated
                .description
                .ends_with(" (Updated based on feedback: tighten the deadline)")
        );
        assert_eq!(updated.kpi, goal().kpi);
        assert_eq!(updated.core_value, goal().core_value);
        assert!(updated.is_complete());
    }

    #[test]
    fn update_truncates_long_comment() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        let comment = "é".repeat(150);
        let updated = fallback_update(&goal(), &comment, today);

        let expected = format!("(Updated based on feedback: {}...)", "é".repeat(100));
        assert!(updated.description.ends_with(&expected));
    }

    #[test]
    fn update_keeps_exactly_100_chars_uncut() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let comment = "x".repeat(100);
        let updated = fallback_update(&goal(), &comment, today);
        assert!(updated.description.ends_with(&format!("{comment})")));
    }
}
