//! Client-facing roadmap document. This is the ONLY shape serialized to
//! API responses and persisted as roadmap content; internal plan fields
//! that are not part of the contract (task resources, goals) are dropped
//! here by construction rather than by a serialization filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::{LearningPlan, WeeklyAssessment, PLAN_WEEKS};
use super::profile::Profile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMeta {
    pub target_role: String,
    pub duration_weeks: u8,
    pub weekly_hours_target: u32,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTask {
    pub id: String,
    pub skill: String,
    pub activity_type: String,
    pub description: String,
    pub est_time_minutes: u32,
    pub acceptance_criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDay {
    pub day_index: u8,
    pub tasks: Vec<WireTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireWeek {
    pub week_index: u8,
    pub theme: String,
    pub skills_focus: Vec<String>,
    pub weekly_task: String,
    pub daily_tasks: Vec<WireDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_assessment: Option<WeeklyAssessment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub weeks: Vec<WireWeek>,
}

/// The complete document returned to clients and stored per roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    pub meta: PlanMeta,
    pub roadmap: Roadmap,
    pub coaching_tips: Vec<String>,
    pub checkpoints: std::collections::BTreeMap<u8, String>,
}

impl PlanDocument {
    /// Projects an internal plan onto the wire contract. Task `resources`
    /// and week `goals` are intentionally absent from the output.
    pub fn from_plan(plan: &LearningPlan, profile: &Profile, generated_at: DateTime<Utc>) -> Self {
        let weeks = plan
            .weeks
            .iter()
            .map(|week| {
                let mut skills_focus: Vec<String> = Vec::new();
                for day in &week.days {
                    for task in &day.tasks {
                        if !skills_focus.contains(&task.skill) {
                            skills_focus.push(task.skill.clone());
                        }
                    }
                }
                WireWeek {
                    week_index: week.week,
                    theme: week.theme.clone(),
                    skills_focus,
                    weekly_task: week.deliverable.clone(),
                    daily_tasks: week
                        .days
                        .iter()
                        .map(|day| WireDay {
                            day_index: day.day,
                            tasks: day
                                .tasks
                                .iter()
                                .map(|task| WireTask {
                                    id: task.id.clone(),
                                    skill: task.skill.clone(),
                                    activity_type: activity_label(task),
                                    description: task.description.clone(),
                                    est_time_minutes: task.est_time_minutes,
                                    acceptance_criteria: task.acceptance_criteria.clone(),
                                })
                                .collect(),
                        })
                        .collect(),
                    weekly_assessment: week.assessment.clone(),
                }
            })
            .collect();

        PlanDocument {
            meta: PlanMeta {
                target_role: plan.role.clone(),
                duration_weeks: PLAN_WEEKS,
                weekly_hours_target: profile.time_budget_hours_per_week,
                generated_at,
            },
            roadmap: Roadmap { weeks },
            coaching_tips: plan.coaching_tips.clone(),
            checkpoints: plan.checkpoints.clone(),
        }
    }
}

fn activity_label(task: &super::plan::Task) -> String {
    // Serializes the enum through serde so wire labels stay in lockstep
    // with the snake_case representation.
    serde_json::to_value(task.activity_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "exercise".to_string())
}
