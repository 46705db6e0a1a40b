//! Plan generation stage: several prompting approaches produce candidate
//! plans; a deterministic fallback guarantees at least one candidate.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::catalog::ResourceCatalog;
use crate::errors::PipelineError;
use crate::llm_client::schemas::{GapAnalysisResult, PlanCandidate};
use crate::llm_client::{generate, GenerationFailure, StructuredGenerator, DEFAULT_MAX_ATTEMPTS};
use crate::models::gap::SkillGap;
use crate::models::plan::{
    ActivityType, DayPlan, LearningPlan, Task, WeekPlan, PLAN_WEEKS, REQUIRED_CHECKPOINT_WEEKS,
};
use crate::models::profile::Profile;
use crate::pipeline::prompts::{render, PLAN_PROMPT_TEMPLATE};

/// Prompting strategies tried in order. Each produces at most one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanApproach {
    FundamentalsFirst,
    ProjectDriven,
    Balanced,
}

pub const ALL_APPROACHES: [PlanApproach; 3] = [
    PlanApproach::FundamentalsFirst,
    PlanApproach::ProjectDriven,
    PlanApproach::Balanced,
];

impl PlanApproach {
    pub fn label(&self) -> &'static str {
        match self {
            PlanApproach::FundamentalsFirst => "fundamentals-first",
            PlanApproach::ProjectDriven => "project-driven",
            PlanApproach::Balanced => "balanced",
        }
    }

    fn guidance(&self) -> &'static str {
        match self {
            PlanApproach::FundamentalsFirst => {
                "Front-load prerequisite and foundational skills; defer integration work \
                 until fundamentals are solid. Favor reading and exercises early, projects late."
            }
            PlanApproach::ProjectDriven => {
                "Anchor every week to a slice of one evolving portfolio project; introduce \
                 theory only as the project demands it. Favor project and exercise tasks."
            }
            PlanApproach::Balanced => {
                "Alternate theory and practice within each week; every concept studied gets \
                 applied within two days. Mix activity types evenly."
            }
        }
    }
}

/// Generates candidate plans, one per approach. Approaches whose output
/// never conforms are skipped; a transport failure aborts. If every
/// approach fails, the deterministic fallback plan is the sole candidate.
pub async fn generate_plans(
    generator: &dyn StructuredGenerator,
    profile: &Profile,
    gaps: &[SkillGap],
    role_id: &str,
    catalog: &ResourceCatalog,
) -> Result<Vec<LearningPlan>, PipelineError> {
    let profile_json = serde_json::to_string_pretty(profile).unwrap_or_default();
    let gaps_json = serde_json::to_string_pretty(&GapAnalysisResult {
        gaps: gaps.to_vec(),
    })
    .unwrap_or_default();
    let resource_ids_json = serde_json::to_string(&catalog.all_ids()).unwrap_or_default();
    let budget = profile.time_budget_hours_per_week.to_string();

    let mut candidates = Vec::new();

    for approach in ALL_APPROACHES {
        let prompt = render(
            PLAN_PROMPT_TEMPLATE,
            &[
                ("role", role_id),
                ("approach", approach.label()),
                ("guidance", approach.guidance()),
                ("profile_json", &profile_json),
                ("gaps_json", &gaps_json),
                ("resource_ids_json", &resource_ids_json),
                ("budget_hours", &budget),
            ],
        );

        match generate::<PlanCandidate>(generator, &prompt, DEFAULT_MAX_ATTEMPTS).await {
            Ok(candidate) => {
                info!(approach = approach.label(), "plan candidate generated");
                candidates.push(candidate.0);
            }
            Err(GenerationFailure::RetriesExhausted { attempts }) => {
                warn!(
                    approach = approach.label(),
                    attempts, "approach produced no conformant plan, skipping"
                );
            }
            Err(e @ GenerationFailure::Transport(_)) => {
                return Err(PipelineError::Generation {
                    stage: "plan generation",
                    source: e,
                });
            }
        }
    }

    if candidates.is_empty() {
        warn!(role = role_id, "all approaches failed, using fallback plan");
        candidates.push(fallback_plan(role_id, gaps, catalog));
    }

    Ok(candidates)
}

/// Deterministic minimal plan used when generation fails entirely. One
/// hour-long task per weekday, cycling through the gap skills, every task
/// referencing a catalog resource for that skill (or the known-safe
/// fallback when the catalog has none).
pub fn fallback_plan(role_id: &str, gaps: &[SkillGap], catalog: &ResourceCatalog) -> LearningPlan {
    let safe = catalog.fallback_resource().unwrap_or("html_mdn").to_string();

    let skills: Vec<&str> = if gaps.is_empty() {
        vec!["Programming"]
    } else {
        gaps.iter().map(|g| g.skill.as_str()).collect()
    };

    let weeks: Vec<WeekPlan> = (1..=PLAN_WEEKS)
        .map(|w| {
            let skill = skills[(w as usize - 1) % skills.len()];
            let resource = catalog
                .search(skill, None)
                .first()
                .map(|(id, _)| id.to_string())
                .unwrap_or_else(|| safe.clone());
            WeekPlan {
                week: w,
                theme: format!("Week {w}: {skill} fundamentals"),
                goals: vec![format!("Build a working baseline in {skill}")],
                deliverable: format!("Notes and completed exercises covering {skill}"),
                days: (1..=5)
                    .map(|d| DayPlan {
                        day: d,
                        tasks: vec![Task {
                            id: Task::position_id(w, d, 1),
                            skill: skill.to_string(),
                            activity_type: ActivityType::Reading,
                            description: format!(
                                "Study {skill} for one focused hour and record what you learned"
                            ),
                            est_time_minutes: 60,
                            acceptance_criteria: vec![
                                "Written summary of at least three concepts covered today"
                                    .to_string(),
                            ],
                            resources: vec![resource.clone()],
                        }],
                    })
                    .collect(),
                assessment: None,
            }
        })
        .collect();

    LearningPlan {
        role: role_id.to_string(),
        weeks,
        coaching_tips: vec![
            "Keep sessions short and consistent rather than long and sporadic".to_string(),
            "Review the previous week's notes before starting a new topic".to_string(),
            "Apply each concept in a small throwaway experiment the same week".to_string(),
        ],
        checkpoints: BTreeMap::from_iter(REQUIRED_CHECKPOINT_WEEKS.map(|w| {
            (
                w,
                format!("Self-assess progress against the week {w} deliverables"),
            )
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::tests::ScriptedGenerator;
    use crate::models::gap::{GapStatus, SkillGap};
    use crate::models::plan::tests::sample_plan;
    use crate::models::profile::LearningStyle;

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

    fn gaps() -> Vec<SkillGap> {
        vec![SkillGap {
            skill: "Docker".to_string(),
            have: 0,
            need: 3,
            status: GapStatus::Partial,
            confidence: 0.5,
            evidence: vec!["no explicit or inferred signal in profile".to_string()],
            effort_hours: 24,
            prereqs: vec![],
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_approaches_failing_yields_single_fallback() {
        // Scenario: the model never returns conformant JSON for any approach.
        let generator = ScriptedGenerator::always("garbage");
        let catalog = ResourceCatalog::curated();

        let plans = generate_plans(&generator, &profile(), &gaps(), "full_stack_engineer", &catalog)
            .await
            .unwrap();

        assert_eq!(plans.len(), 1);
        let fallback = &plans[0];
        assert!(fallback.validate_structure().is_ok());
        assert_eq!(fallback.weeks.len(), 12);
        for id in fallback.referenced_resources() {
            assert!(catalog.contains(id));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_conformant_candidates_are_collected() {
        let plan_json =
            serde_json::to_string(&sample_plan("full_stack_engineer", "html_mdn")).unwrap();
        let generator = ScriptedGenerator::always(&plan_json);
        let catalog = ResourceCatalog::curated();

        let plans = generate_plans(&generator, &profile(), &gaps(), "full_stack_engineer", &catalog)
            .await
            .unwrap();

        assert_eq!(plans.len(), ALL_APPROACHES.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_aborts_generation() {
        let generator = ScriptedGenerator::new(vec![Err(())]);
        let catalog = ResourceCatalog::curated();

        let err = generate_plans(&generator, &profile(), &gaps(), "full_stack_engineer", &catalog)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Generation {
                stage: "plan generation",
                ..
            }
        ));
    }

    #[test]
    fn test_fallback_plan_cycles_gap_skills() {
        let catalog = ResourceCatalog::curated();
        let many_gaps: Vec<SkillGap> = ["Docker", "SQL"]
            .iter()
            .map(|skill| SkillGap {
                skill: skill.to_string(),
                ..gaps()[0].clone()
            })
            .collect();

        let plan = fallback_plan("full_stack_engineer", &many_gaps, &catalog);
        assert!(plan.validate_structure().is_ok());
        assert!(plan.weeks[0].theme.contains("Docker"));
        assert!(plan.weeks[1].theme.contains("SQL"));
        assert!(plan.weeks[2].theme.contains("Docker"));
    }

    #[test]
    fn test_fallback_plan_valid_with_no_gaps() {
        let catalog = ResourceCatalog::curated();
        let plan = fallback_plan("full_stack_engineer", &[], &catalog);
        assert!(plan.validate_structure().is_ok());
    }
}
