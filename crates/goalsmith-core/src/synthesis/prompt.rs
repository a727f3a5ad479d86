//! Prompt construction: context assembly and instruction templates.
//!
//! Pure string building; no I/O.

use crate::catalog::PromptCatalog;
use crate::goal::{Goal, GoalRequest};

/// Five-point KPI rubric the model must embed in every `kpi` field.
const KPI_RUBRIC: &str = "\
- 5 points: Significantly exceed the goal or achieve it much faster than planned
- 4 points: Exceed the goal
- 3 points: Fully achieve the goal as planned
- 2 points: Partially achieve the goal
- 1 point: Underperform or do not achieve the goal
";

/// Render a list as a JSON array so quoting inside items stays unambiguous.
fn render_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Assemble the context block for a synthesis request.
///
/// Interpolates every request field, the department's example goals and the
/// three global catalog lists.
pub fn build_context(request: &GoalRequest, catalog: &PromptCatalog) -> String {
    format!(
        "Job Title: {job_title}\n\
         Department: {department}\n\
         Goal Description: {goal_description}\n\
         Key Results: {key_results}\n\
         Deadline: {deadline}\n\
         Manager's Goal: {managers_goal}\n\
         Example Goals: {examples}\n\
         Core Values: {core_values}\n\
         3E Strategic Framework: {framework_3e}\n\
         Company Top Bets: {company_top_bets}",
        job_title = request.job_title,
        department = request.department,
        goal_description = request.goal_description,
        key_results = request.key_results,
        deadline = request.deadline,
        managers_goal = request.managers_goal,
        examples = render_list(catalog.examples_for(&request.department)),
        core_values = render_list(&catalog.core_values),
        framework_3e = render_list(&catalog.framework_3e),
        company_top_bets = render_list(&catalog.company_top_bets),
    )
}

/// Wrap a context block in the three-goal generation instructions.
pub fn render_synthesis_prompt(context: &str) -> String {
    let mut prompt = String::with_capacity(context.len() + 1024);
    prompt.push_str("Context: ");
    prompt.push_str(context);
    prompt.push('\n');
    prompt.push_str(
        "Instructions: Generate 3 SMART goals as a JSON array with fields: \
         title, description, kpi, companyTopBetAlignment, framework3E, coreValue. \
         Each goal must be concise and specific, measurable, achievable, relevant, \
         time-bound, and aligned with the most relevant company bet, 3E framework, \
         and core value. For each goal, the 'kpi' field should include both the KPI \
         metric and the KPI points system (maximum 5 points per goal). Do not put the \
         points system in a separate field; include it under the kpi field only, \
         followed in bullets:\n",
    );
    prompt.push_str(KPI_RUBRIC);
    prompt.push_str(
        "This KPI points system will be used for end-of-year performance reviews \
         and bonuses, so make it clear and relevant for each goal. Also, ensure each \
         goal addresses the manager's goal.",
    );
    prompt
}

/// Render the prompt that revises one goal according to user feedback.
pub fn render_update_prompt(goal: &Goal, comment: &str, catalog: &PromptCatalog) -> String {
    let mut prompt = String::with_capacity(2048);
    prompt.push_str("You are tasked with updating a SMART goal based on user feedback.\n\n");

    prompt.push_str("Original Goal:\n");
    prompt.push_str(&format!("Title: {}\n", goal.title));
    prompt.push_str(&format!("Description: {}\n", goal.description));
    prompt.push_str(&format!("KPI: {}\n", goal.kpi));
    prompt.push_str(&format!(
        "Company Top Bet Alignment: {}\n",
        goal.company_top_bet_alignment
    ));
    prompt.push_str(&format!("3E Framework: {}\n", goal.framework_3e));
    prompt.push_str(&format!("Core Value: {}\n\n", goal.core_value));

    prompt.push_str(&format!("User's Update Request: {comment}\n\n"));

    prompt.push_str(&format!(
        "Core Values Available: {}\n",
        render_list(&catalog.core_values)
    ));
    prompt.push_str(&format!(
        "3E Strategic Framework Options: {}\n",
        render_list(&catalog.framework_3e)
    ));
    prompt.push_str(&format!(
        "Company Top Bets: {}\n\n",
        render_list(&catalog.company_top_bets)
    ));

    prompt.push_str(
        "Instructions:\n\
         1. Update the goal based on the user's feedback while maintaining SMART criteria\n\
         2. Keep the goal specific, measurable, achievable, relevant, and time-bound\n\
         3. Ensure alignment with appropriate company values, framework, and top bets\n\
         4. For the KPI field, include both the metric and the 5-point scoring system:\n",
    );
    for line in KPI_RUBRIC.lines() {
        prompt.push_str("   ");
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push('\n');
    prompt.push_str(
        "Return ONLY a valid JSON object with the updated goal containing these exact fields:\n\
         title, description, kpi, companyTopBetAlignment, framework3E, coreValue",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::DEFAULT_MANAGERS_GOAL;

    fn request(department: &str) -> GoalRequest {
        GoalRequest {
            job_title: "Data Analyst".to_string(),
            department: department.to_string(),
            goal_description: "Automate weekly reporting".to_string(),
            key_results: "Save 6 hours per week".to_string(),
            deadline: "2025-12-31".to_string(),
            managers_goal: DEFAULT_MANAGERS_GOAL.to_string(),
        }
    }

    fn catalog() -> PromptCatalog {
        PromptCatalog::from_json(
            r#"{
                "core_values": ["Own the Outcome"],
                "framework_3e": ["ELEVATE"],
                "company_top_bets": ["INVESTING FOR SCALE"],
                "finance": {"examples": ["Close books in 5 days"]}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn context_contains_every_field() {
        let ctx = build_context(&request("Finance"), &catalog());
        assert!(ctx.starts_with("Job Title: Data Analyst\n"));
        assert!(ctx.contains("Department: Finance\n"));
        assert!(ctx.contains("Goal Description: Automate weekly reporting\n"));
        assert!(ctx.contains("Key Results: Save 6 hours per week\n"));
        assert!(ctx.contains("Deadline: 2025-12-31\n"));
        assert!(ctx.contains(&format!("Manager's Goal: {DEFAULT_MANAGERS_GOAL}\n")));
        assert!(ctx.contains(r#"Example Goals: ["Close books in 5 days"]"#));
        assert!(ctx.contains(r#"Core Values: ["Own the Outcome"]"#));
        assert!(ctx.contains(r#"3E Strategic Framework: ["ELEVATE"]"#));
        assert!(ctx.ends_with(r#"Company Top Bets: ["INVESTING FOR SCALE"]"#));
    }

    #[test]
    fn context_with_unknown_department_has_empty_examples() {
        let ctx = build_context(&request("Legal"), &catalog());
        assert!(ctx.contains("Example Goals: []\n"));
    }

    #[test]
    fn synthesis_prompt_embeds_context_and_rubric() {
        let prompt = render_synthesis_prompt("CTX");
        assert!(prompt.starts_with("Context: CTX\nInstructions:"));
        assert!(prompt.contains("Generate 3 SMART goals as a JSON array"));
        assert!(prompt.contains("companyTopBetAlignment, framework3E, coreValue"));
        assert!(prompt.contains("- 1 point: Underperform"));
        assert!(prompt.contains("manager's goal"));
    }

    #[test]
    fn update_prompt_embeds_goal_comment_and_catalog() {
        let goal = Goal {
            title: "Automate reporting".to_string(),
            description: "Build the pipeline".to_string(),
            kpi: "6 hours saved".to_string(),
            company_top_bet_alignment: "INVESTING FOR SCALE".to_string(),
            framework_3e: "ELEVATE".to_string(),
            core_value: "Own the Outcome".to_string(),
        };
        let prompt = render_update_prompt(&goal, "make it quarterly", &catalog());
        assert!(prompt.contains("Title: Automate reporting\n"));
        assert!(prompt.contains("3E Framework: ELEVATE\n"));
        assert!(prompt.contains("User's Update Request: make it quarterly\n"));
        assert!(prompt.contains(r#"Core Values Available: ["Own the Outcome"]"#));
        assert!(prompt.contains("   - 5 points:"));
        assert!(prompt.contains("Return ONLY a valid JSON object"));
    }
}
