//! Plan evaluation stage: picks the strongest candidate.
//!
//! A single candidate short-circuits, a failed or out-of-range judgment
//! falls back to the first candidate, and an empty list yields `None` for
//! the caller to substitute its own fallback.

use tracing::{info, warn};

use crate::llm_client::schemas::{GapAnalysisResult, PlanEvaluation};
use crate::llm_client::{generate, StructuredGenerator, DEFAULT_MAX_ATTEMPTS};
use crate::models::gap::SkillGap;
use crate::models::plan::LearningPlan;
use crate::models::profile::Profile;
use crate::pipeline::prompts::{render, EVALUATION_PROMPT_TEMPLATE};

/// Selects one plan from the candidate list. Never fails: any evaluation
/// problem degrades to picking the first candidate; only an empty list
/// produces `None`.
pub async fn evaluate(
    generator: &dyn StructuredGenerator,
    profile: &Profile,
    gaps: &[SkillGap],
    mut candidates: Vec<LearningPlan>,
) -> Option<LearningPlan> {
    if candidates.is_empty() {
        warn!("no candidates to evaluate");
        return None;
    }
    if candidates.len() == 1 {
        return Some(candidates.remove(0));
    }

    let prompt = render(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("candidate_count", &candidates.len().to_string()),
            (
                "profile_json",
                &serde_json::to_string_pretty(profile).unwrap_or_default(),
            ),
            (
                "gaps_json",
                &serde_json::to_string_pretty(&GapAnalysisResult {
                    gaps: gaps.to_vec(),
                })
                .unwrap_or_default(),
            ),
            (
                "plans_json",
                &serde_json::to_string(&candidates).unwrap_or_default(),
            ),
        ],
    );

    let chosen = match generate::<PlanEvaluation>(generator, &prompt, DEFAULT_MAX_ATTEMPTS).await {
        Ok(evaluation) if evaluation.best_plan_index < candidates.len() => {
            info!(
                winner = evaluation.best_plan_index,
                reasoning = %evaluation.reasoning,
                "plan evaluation selected a candidate"
            );
            candidates.swap_remove(evaluation.best_plan_index)
        }
        Ok(evaluation) => {
            warn!(
                index = evaluation.best_plan_index,
                candidates = candidates.len(),
                "evaluation index out of range, keeping first candidate"
            );
            candidates.remove(0)
        }
        Err(e) => {
            warn!("plan evaluation failed ({e}), keeping first candidate");
            candidates.remove(0)
        }
    };
    Some(chosen)
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

    fn candidates() -> Vec<LearningPlan> {
        vec![
            sample_plan("full_stack_engineer", "html_mdn"),
            sample_plan("full_stack_engineer", "react_docs"),
            sample_plan("full_stack_engineer", "sql_w3schools"),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_candidate_short_circuits() {
        // No LLM call should happen at all.
        let generator = ScriptedGenerator::new(vec![Err(())]);
        let only = vec![sample_plan("full_stack_engineer", "html_mdn")];

        let chosen = evaluate(&generator, &profile(), &[], only).await.unwrap();
        assert_eq!(chosen.referenced_resources(), vec!["html_mdn"]);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_candidate_list_yields_none() {
        let generator = ScriptedGenerator::new(vec![Err(())]);

        let chosen = evaluate(&generator, &profile(), &[], vec![]).await;
        assert!(chosen.is_none());
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_winner_index_is_honored() {
        let generator = ScriptedGenerator::always(
            r#"{"best_plan_index": 2, "reasoning": "best gap coverage", "scores": [6.0, 7.0, 9.0]}"#,
        );

        let chosen = evaluate(&generator, &profile(), &[], candidates()).await.unwrap();
        assert_eq!(chosen.referenced_resources(), vec!["sql_w3schools"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_evaluation_keeps_first_candidate() {
        let generator = ScriptedGenerator::always("garbage");

        let chosen = evaluate(&generator, &profile(), &[], candidates()).await.unwrap();
        assert_eq!(chosen.referenced_resources(), vec!["html_mdn"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_scores_rejected_then_first_kept() {
        // best_plan_index valid for 5 scores but not for 3 candidates.
        let generator = ScriptedGenerator::always(
            r#"{"best_plan_index": 4, "reasoning": "oops", "scores": [1.0, 2.0, 3.0, 4.0, 5.0]}"#,
        );

        let chosen = evaluate(&generator, &profile(), &[], candidates()).await.unwrap();
        assert_eq!(chosen.referenced_resources(), vec!["html_mdn"]);
    }
}
