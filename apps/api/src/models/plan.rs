//! Learning-plan structures shared by the generator, evaluator, oracle,
//! and finalizer. `LearningPlan::validate_structure` is the single
//! structural gate applied to both LLM output and the deterministic
//! fallback plan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed plan horizon.
pub const PLAN_WEEKS: u8 = 12;
/// Weeks that must carry a checkpoint milestone.
pub const REQUIRED_CHECKPOINT_WEEKS: [u8; 3] = [4, 8, 12];
pub const MIN_DAILY_BUNDLES: usize = 5;
pub const MAX_DAILY_BUNDLES: usize = 7;
pub const MIN_TASK_MINUTES: u32 = 15;
pub const MAX_TASK_MINUTES: u32 = 240;
pub const MIN_COACHING_TIPS: usize = 3;
pub const MAX_COACHING_TIPS: usize = 10;

/// Category of a daily learning activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Reading,
    Video,
    Exercise,
    Project,
    Review,
    Assessment,
}

/// A single daily task. `id` encodes position as `w{week}d{day}t{ordinal}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub skill: String,
    pub activity_type: ActivityType,
    pub description: String,
    pub est_time_minutes: u32,
    pub acceptance_criteria: Vec<String>,
    /// Resource IDs; must resolve in the resource catalog.
    pub resources: Vec<String>,
}

impl Task {
    pub fn position_id(week: u8, day: u8, ordinal: u8) -> String {
        format!("w{week}d{day}t{ordinal}")
    }
}

/// One day's worth of tasks within a week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u8,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAssessment {
    #[serde(rename = "type")]
    pub kind: String,
    pub instructions: String,
    pub estimated_hours: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub week: u8,
    pub theme: String,
    pub goals: Vec<String>,
    pub deliverable: String,
    pub days: Vec<DayPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<WeeklyAssessment>,
}

impl WeekPlan {
    /// Sum of task minutes across all days of the week.
    pub fn total_minutes(&self) -> u32 {
        self.days
            .iter()
            .flat_map(|d| d.tasks.iter())
            .map(|t| t.est_time_minutes)
            .sum()
    }

    pub fn task_count(&self) -> usize {
        self.days.iter().map(|d| d.tasks.len()).sum()
    }
}

/// A complete multi-week learning plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPlan {
    pub role: String,
    pub weeks: Vec<WeekPlan>,
    pub coaching_tips: Vec<String>,
    /// Week number → milestone description. Must include weeks 4, 8, 12.
    pub checkpoints: BTreeMap<u8, String>,
}

impl LearningPlan {
    /// Structural validation applied to every candidate plan before it is
    /// allowed further into the pipeline.
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.role.trim().is_empty() {
            return Err("plan role must be non-empty".to_string());
        }
        if self.weeks.len() != PLAN_WEEKS as usize {
            return Err(format!(
                "plan must have exactly {PLAN_WEEKS} weeks, got {}",
                self.weeks.len()
            ));
        }
        for (i, week) in self.weeks.iter().enumerate() {
            let expected = i as u8 + 1;
            if week.week != expected {
                return Err(format!(
                    "week at position {i} has index {}, expected {expected}",
                    week.week
                ));
            }
            if week.theme.trim().is_empty() {
                return Err(format!("week {expected}: theme must be non-empty"));
            }
            if week.goals.is_empty() || week.goals.len() > 3 {
                return Err(format!(
                    "week {expected}: must have 1-3 goals, got {}",
                    week.goals.len()
                ));
            }
            if week.deliverable.trim().is_empty() {
                return Err(format!("week {expected}: deliverable must be non-empty"));
            }
            if week.days.len() < MIN_DAILY_BUNDLES || week.days.len() > MAX_DAILY_BUNDLES {
                return Err(format!(
                    "week {expected}: must have {MIN_DAILY_BUNDLES}-{MAX_DAILY_BUNDLES} daily task bundles, got {}",
                    week.days.len()
                ));
            }
            for day in &week.days {
                if day.tasks.is_empty() {
                    return Err(format!(
                        "week {expected} day {}: must have at least one task",
                        day.day
                    ));
                }
                for task in &day.tasks {
                    if !(MIN_TASK_MINUTES..=MAX_TASK_MINUTES).contains(&task.est_time_minutes) {
                        return Err(format!(
                            "task {}: est_time_minutes must be within [{MIN_TASK_MINUTES}, {MAX_TASK_MINUTES}], got {}",
                            task.id, task.est_time_minutes
                        ));
                    }
                    if task.acceptance_criteria.is_empty()
                        || task.acceptance_criteria.iter().any(|c| c.trim().is_empty())
                    {
                        return Err(format!(
                            "task {}: acceptance criteria must be present and non-empty",
                            task.id
                        ));
                    }
                    if task.resources.is_empty() {
                        return Err(format!(
                            "task {}: must reference at least one resource",
                            task.id
                        ));
                    }
                }
            }
        }
        if self.coaching_tips.len() < MIN_COACHING_TIPS
            || self.coaching_tips.len() > MAX_COACHING_TIPS
        {
            return Err(format!(
                "plan must have {MIN_COACHING_TIPS}-{MAX_COACHING_TIPS} coaching tips, got {}",
                self.coaching_tips.len()
            ));
        }
        for week in REQUIRED_CHECKPOINT_WEEKS {
            if !self.checkpoints.contains_key(&week) {
                return Err(format!("plan must have a checkpoint at week {week}"));
            }
        }
        Ok(())
    }

    /// All distinct resource IDs referenced anywhere in the plan.
    pub fn referenced_resources(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for week in &self.weeks {
            for day in &week.days {
                for task in &day.tasks {
                    for r in &task.resources {
                        if !seen.contains(&r.as_str()) {
                            seen.push(r.as_str());
                        }
                    }
                }
            }
        }
        seen
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A minimal structurally-valid 12-week plan used across pipeline tests.
    pub fn sample_plan(role: &str, resource: &str) -> LearningPlan {
        let weeks = (1..=PLAN_WEEKS)
            .map(|w| WeekPlan {
                week: w,
                theme: format!("Week {w}: Core Skills"),
                goals: vec![format!("Make measurable progress in week {w}")],
                deliverable: format!("Working notes and exercises from week {w}"),
                days: (1..=5)
                    .map(|d| DayPlan {
                        day: d,
                        tasks: vec![Task {
                            id: Task::position_id(w, d, 1),
                            skill: "JavaScript".to_string(),
                            activity_type: ActivityType::Reading,
                            description: format!("Study session for week {w} day {d}"),
                            est_time_minutes: 60,
                            acceptance_criteria: vec![
                                "Complete the material and write summary notes".to_string(),
                            ],
                            resources: vec![resource.to_string()],
                        }],
                    })
                    .collect(),
                assessment: None,
            })
            .collect();

        LearningPlan {
            role: role.to_string(),
            weeks,
            coaching_tips: vec![
                "Stay consistent".to_string(),
                "Practice daily".to_string(),
                "Build projects".to_string(),
            ],
            checkpoints: BTreeMap::from([
                (4, "First milestone".to_string()),
                (8, "Midpoint check".to_string()),
                (12, "Final assessment".to_string()),
            ]),
        }
    }

    #[test]
    fn test_sample_plan_is_structurally_valid() {
        assert!(sample_plan("full_stack_engineer", "html_mdn")
            .validate_structure()
            .is_ok());
    }

    #[test]
    fn test_wrong_week_count_rejected() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks.pop();
        assert!(plan.validate_structure().is_err());
    }

    #[test]
    fn test_out_of_order_week_index_rejected() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[3].week = 9;
        assert!(plan.validate_structure().is_err());
    }

    #[test]
    fn test_missing_checkpoint_rejected() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.checkpoints.remove(&8);
        let err = plan.validate_structure().unwrap_err();
        assert!(err.contains("week 8"));
    }

    #[test]
    fn test_task_minutes_bounds_enforced() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[0].days[0].tasks[0].est_time_minutes = 5;
        assert!(plan.validate_structure().is_err());
        plan.weeks[0].days[0].tasks[0].est_time_minutes = 300;
        assert!(plan.validate_structure().is_err());
    }

    #[test]
    fn test_too_few_daily_bundles_rejected() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[0].days.truncate(4);
        assert!(plan.validate_structure().is_err());
    }

    #[test]
    fn test_empty_acceptance_criteria_rejected() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[0].days[0].tasks[0].acceptance_criteria.clear();
        assert!(plan.validate_structure().is_err());
    }

    #[test]
    fn test_coaching_tip_bounds() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.coaching_tips.truncate(2);
        assert!(plan.validate_structure().is_err());
        plan.coaching_tips = (0..11).map(|i| format!("tip {i}")).collect();
        assert!(plan.validate_structure().is_err());
    }

    #[test]
    fn test_referenced_resources_deduplicates() {
        let plan = sample_plan("full_stack_engineer", "html_mdn");
        assert_eq!(plan.referenced_resources(), vec!["html_mdn"]);
    }

    #[test]
    fn test_task_position_id_encoding() {
        assert_eq!(Task::position_id(3, 2, 1), "w3d2t1");
    }

    #[test]
    fn test_checkpoint_keys_roundtrip_as_json_strings() {
        let plan = sample_plan("full_stack_engineer", "html_mdn");
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains(r#""4":"First milestone""#));
        let back: LearningPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.checkpoints, plan.checkpoints);
    }
}
