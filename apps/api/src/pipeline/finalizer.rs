//! Finalizer stage: purely additive coaching personalization.

use tracing::warn;

use crate::llm_client::schemas::CoachingEnhancement;
use crate::llm_client::{generate, StructuredGenerator, DEFAULT_MAX_ATTEMPTS};
use crate::models::plan::{LearningPlan, MAX_COACHING_TIPS};
use crate::models::profile::Profile;
use crate::pipeline::prompts::{render, COACHING_PROMPT_TEMPLATE};

/// Appends personalized coaching tips. Never removes or reorders existing
/// plan content, and any failure returns the input plan unchanged.
pub async fn personalize(
    generator: &dyn StructuredGenerator,
    mut plan: LearningPlan,
    profile: &Profile,
) -> LearningPlan {
    let plan_summary: String = plan
        .weeks
        .iter()
        .map(|w| format!("Week {}: {} -> {}\n", w.week, w.theme, w.deliverable))
        .collect();

    let prompt = render(
        COACHING_PROMPT_TEMPLATE,
        &[
            (
                "profile_json",
                &serde_json::to_string_pretty(profile).unwrap_or_default(),
            ),
            ("plan_summary", &plan_summary),
            (
                "existing_tips_json",
                &serde_json::to_string(&plan.coaching_tips).unwrap_or_default(),
            ),
        ],
    );

    match generate::<CoachingEnhancement>(generator, &prompt, DEFAULT_MAX_ATTEMPTS).await {
        Ok(enhancement) => {
            for tip in enhancement.additional_coaching_tips {
                if plan.coaching_tips.len() >= MAX_COACHING_TIPS {
                    break;
                }
                if !plan.coaching_tips.contains(&tip) {
                    plan.coaching_tips.push(tip);
                }
            }
            plan
        }
        Err(e) => {
            warn!("coaching personalization failed ({e}), keeping plan as generated");
            plan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::tests::ScriptedGenerator;
    use crate::models::plan::tests::sample_plan;
    use crate::models::profile::LearningStyle;
    use std::collections::BTreeMap;

    fn profile() -> Profile {
        Profile {
            user_id: "user_001".to_string(),
            years_total: 2.0,
            skills: BTreeMap::from([("JavaScript".to_string(), 4.0)]),
            projects: vec![],
            certifications: vec![],
            repos: vec![],
            time_budget_hours_per_week: 10,
            learning_style: LearningStyle::Mixed,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tips_are_appended_without_touching_structure() {
        let generator = ScriptedGenerator::always(
            r#"{"additional_coaching_tips": ["Pair with another learner once a week.", "Keep a decision log for your project."]}"#,
        );
        let plan = sample_plan("full_stack_engineer", "html_mdn");
        let before_weeks = plan.weeks.clone();
        let before_tips = plan.coaching_tips.clone();

        let result = personalize(&generator, plan, &profile()).await;
        assert_eq!(result.weeks, before_weeks);
        assert_eq!(&result.coaching_tips[..before_tips.len()], &before_tips[..]);
        assert_eq!(result.coaching_tips.len(), before_tips.len() + 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tip_count_capped_at_maximum() {
        let tips: Vec<String> = (0..8).map(|i| format!("Unique actionable tip {i}")).collect();
        let body = serde_json::json!({ "additional_coaching_tips": tips }).to_string();
        let generator = ScriptedGenerator::always(&body);

        let result = personalize(&generator, sample_plan("full_stack_engineer", "html_mdn"), &profile()).await;
        assert_eq!(result.coaching_tips.len(), MAX_COACHING_TIPS);
        assert!(result.validate_structure().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_tips_are_not_appended() {
        let generator = ScriptedGenerator::always(
            r#"{"additional_coaching_tips": ["Stay consistent"]}"#,
        );
        let plan = sample_plan("full_stack_engineer", "html_mdn");
        let before = plan.coaching_tips.clone();

        let result = personalize(&generator, plan, &profile()).await;
        assert_eq!(result.coaching_tips, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_returns_plan_unchanged() {
        let generator = ScriptedGenerator::always("garbage");
        let plan = sample_plan("full_stack_engineer", "html_mdn");
        let before = plan.clone();

        let result = personalize(&generator, plan, &profile()).await;
        assert_eq!(result, before);
    }
}
