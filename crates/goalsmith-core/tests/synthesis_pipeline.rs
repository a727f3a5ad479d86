//! End-to-end tests of `GoalSynthesizer` against a scripted generator.

use std::sync::Arc;

use goalsmith_core::goal::UpdateRequest;
use goalsmith_core::synthesis::{Source, fallback_goals};
use goalsmith_test_utils::{ScriptedGenerator, goals_json, sample_goal, sample_request, synthesizer};

#[tokio::test]
async fn first_valid_response_is_used() {
    let generator = Arc::new(ScriptedGenerator::new().then_text(goals_json(3)));
    let synth = synthesizer(generator.clone());

    let result = synth.generate_goals(&sample_request()).await;

    assert_eq!(result.source(), Source::Generated);
    assert_eq!(result.attempts(), 1);
    assert_eq!(result.value().len(), 3);
    assert_eq!(result.value()[0].title, "goal 1 title");
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn prompt_carries_request_and_department_examples() {
    let generator = Arc::new(ScriptedGenerator::new().then_text(goals_json(3)));
    let synth = synthesizer(generator.clone());

    synth.generate_goals(&sample_request()).await;

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("Backend Engineer"));
    assert!(prompt.contains("Improve API reliability"));
    assert!(prompt.contains("Ship a stable platform"));
    let examples = synth.catalog().examples_for("engineering");
    assert!(!examples.is_empty());
    assert!(prompt.contains(&examples[0]));
}

#[tokio::test]
async fn fenced_output_with_trailing_commas_is_accepted() {
    let body = goals_json(3);
    let with_comma = format!("{},]", body.trim_end_matches(']'));
    let messy = format!("Sure! Here you go:\n```json\n{with_comma}\n```\nAnything else?");
    let generator = Arc::new(ScriptedGenerator::new().then_text(messy));
    let synth = synthesizer(generator.clone());

    let result = synth.generate_goals(&sample_request()).await;

    assert_eq!(result.source(), Source::Generated);
    assert_eq!(result.value().len(), 3);
}

#[tokio::test]
async fn malformed_outputs_are_retried() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .then_text("not json at all")
            .then_text(goals_json(2))
            .then_text(goals_json(3)),
    );
    let synth = synthesizer(generator.clone());

    let result = synth.generate_goals(&sample_request()).await;

    assert_eq!(result.source(), Source::Generated);
    assert_eq!(result.attempts(), 3);
    assert_eq!(generator.calls(), 3);
}

#[tokio::test]
async fn exhausted_retries_fall_back_to_templates() {
    let generator = Arc::new(ScriptedGenerator::failing());
    let synth = synthesizer(generator.clone());
    let request = sample_request();

    let result = synth.generate_goals(&request).await;

    assert!(result.is_fallback());
    assert_eq!(result.attempts(), 3);
    assert_eq!(generator.calls(), 3, "exactly max_attempts calls");
    assert_eq!(result.value(), &fallback_goals(&request));
    assert!(result.value().iter().all(|g| g.is_complete()));
}

#[tokio::test]
async fn incomplete_goal_counts_as_failure() {
    let mut goals: Vec<serde_json::Value> =
        serde_json::from_str(&goals_json(3)).expect("fixture parses");
    goals[1]["kpi"] = serde_json::json!("");
    let generator = Arc::new(
        ScriptedGenerator::new()
            .then_text(serde_json::to_string(&goals).expect("serialize"))
            .then_text(goals_json(3)),
    );
    let synth = synthesizer(generator.clone());

    let result = synth.generate_goals(&sample_request()).await;

    assert_eq!(result.source(), Source::Generated);
    assert_eq!(result.attempts(), 2);
}

#[tokio::test]
async fn update_uses_model_goal_when_valid() {
    let revised = sample_goal("revised");
    let generator = Arc::new(
        ScriptedGenerator::new().then_text(serde_json::to_string(&revised).expect("serialize")),
    );
    let synth = synthesizer(generator.clone());
    let request = UpdateRequest {
        goal: sample_goal("original"),
        comment: "make it quarterly".to_string(),
    };

    let result = synth.update_goal(&request).await;

    assert_eq!(result.source(), Source::Generated);
    assert_eq!(result.value(), &revised);
    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("make it quarterly"));
    assert!(prompt.contains("original title"));
}

#[tokio::test]
async fn update_falls_back_to_cosmetic_edit() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .then_text(r#"{"title": "only a title"}"#)
            .then_error("upstream 503"),
    );
    let synth = synthesizer(generator.clone());
    let original = sample_goal("original");
    let request = UpdateRequest {
        goal: original.clone(),
        comment: "tighten the deadline".to_string(),
    };

    let result = synth.update_goal(&request).await;

    assert!(result.is_fallback());
    assert_eq!(generator.calls(), 3);
    let goal = result.value();
    assert!(goal.title.starts_with("original title (Modified "));
    assert!(goal.description.contains("tighten the deadline"));
    assert_eq!(goal.kpi, original.kpi);
    assert_eq!(goal.core_value, original.core_value);
}
