//! Constraint oracle: deterministic plan validation, no external calls.
//!
//! Violations are values, not errors. A plan with violations is still
//! usable; what happens to it is decided by the configured
//! [`ViolationPolicy`], never by the oracle itself.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::ResourceCatalog;
use crate::models::plan::{LearningPlan, MAX_TASK_MINUTES, MIN_TASK_MINUTES};
use crate::models::profile::Profile;

/// A task longer than this (minutes) counts as a long session.
pub const LONG_SESSION_THRESHOLD_MINUTES: u32 = 120;
pub const MAX_LONG_SESSIONS_PER_WEEK: usize = 2;
/// Acceptance criteria shorter than this are not considered verifiable.
pub const MIN_VERIFY_LEN: usize = 10;
/// Weekly minutes may exceed the budget by up to this factor.
pub const BUDGET_TOLERANCE: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    LongSessionCount,
    MissingVerification,
    UnknownResource,
    WeeklyBudgetExceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub week: u8,
    pub kind: ViolationKind,
    pub detail: String,
}

/// Checks every week of the plan against the deterministic constraints.
/// Read-only: the input plan is never modified.
pub fn enforce(plan: &LearningPlan, profile: &Profile, catalog: &ResourceCatalog) -> Vec<Violation> {
    let mut violations = Vec::new();
    let budget_minutes = profile.time_budget_hours_per_week as f32 * 60.0;

    for week in &plan.weeks {
        let long_sessions = week
            .days
            .iter()
            .flat_map(|d| d.tasks.iter())
            .filter(|t| t.est_time_minutes > LONG_SESSION_THRESHOLD_MINUTES)
            .count();
        if long_sessions > MAX_LONG_SESSIONS_PER_WEEK {
            violations.push(Violation {
                week: week.week,
                kind: ViolationKind::LongSessionCount,
                detail: format!(
                    "{long_sessions} sessions over {LONG_SESSION_THRESHOLD_MINUTES} minutes (max {MAX_LONG_SESSIONS_PER_WEEK})"
                ),
            });
        }

        for day in &week.days {
            for task in &day.tasks {
                if !task
                    .acceptance_criteria
                    .iter()
                    .any(|c| c.trim().len() >= MIN_VERIFY_LEN)
                {
                    violations.push(Violation {
                        week: week.week,
                        kind: ViolationKind::MissingVerification,
                        detail: format!("task {} has no verifiable acceptance criterion", task.id),
                    });
                }
                for resource in &task.resources {
                    if !catalog.contains(resource) {
                        violations.push(Violation {
                            week: week.week,
                            kind: ViolationKind::UnknownResource,
                            detail: format!("task {} references unknown resource '{resource}'", task.id),
                        });
                    }
                }
            }
        }

        let total = week.total_minutes() as f32;
        if total > budget_minutes * BUDGET_TOLERANCE {
            violations.push(Violation {
                week: week.week,
                kind: ViolationKind::WeeklyBudgetExceeded,
                detail: format!(
                    "{total:.0} minutes planned against a budget of {budget_minutes:.0} (tolerance {BUDGET_TOLERANCE}x)"
                ),
            });
        }
    }

    violations
}

/// What to do with a plan once its violations are known.
pub trait ViolationPolicy: Send + Sync {
    fn apply(&self, plan: LearningPlan, profile: &Profile, violations: &[Violation])
        -> LearningPlan;
    fn name(&self) -> &'static str;
}

/// Default policy: log and pass the plan through untouched.
pub struct ReportOnly;

impl ViolationPolicy for ReportOnly {
    fn apply(
        &self,
        plan: LearningPlan,
        _profile: &Profile,
        violations: &[Violation],
    ) -> LearningPlan {
        for v in violations {
            warn!(week = v.week, kind = ?v.kind, "constraint violation: {}", v.detail);
        }
        plan
    }

    fn name(&self) -> &'static str {
        "report-only"
    }
}

/// Clips excess long sessions down to the threshold and scales over-budget
/// weeks back inside the tolerance. Only minutes are touched; week and task
/// structure is preserved.
pub struct ClipMinutes;

impl ViolationPolicy for ClipMinutes {
    fn apply(
        &self,
        mut plan: LearningPlan,
        profile: &Profile,
        violations: &[Violation],
    ) -> LearningPlan {
        let budget_minutes = profile.time_budget_hours_per_week as f32 * 60.0;

        for violation in violations {
            let Some(week) = plan.weeks.iter_mut().find(|w| w.week == violation.week) else {
                continue;
            };
            match violation.kind {
                ViolationKind::LongSessionCount => {
                    let mut kept = 0;
                    for task in week.days.iter_mut().flat_map(|d| d.tasks.iter_mut()) {
                        if task.est_time_minutes > LONG_SESSION_THRESHOLD_MINUTES {
                            if kept < MAX_LONG_SESSIONS_PER_WEEK {
                                kept += 1;
                            } else {
                                warn!(
                                    task = %task.id,
                                    from = task.est_time_minutes,
                                    "clipping long session to threshold"
                                );
                                task.est_time_minutes = LONG_SESSION_THRESHOLD_MINUTES;
                            }
                        }
                    }
                }
                ViolationKind::WeeklyBudgetExceeded => {
                    let total = week.total_minutes() as f32;
                    let allowed = budget_minutes * BUDGET_TOLERANCE;
                    let scale = allowed / total;
                    for task in week.days.iter_mut().flat_map(|d| d.tasks.iter_mut()) {
                        let scaled = (task.est_time_minutes as f32 * scale).floor() as u32;
                        task.est_time_minutes = scaled.clamp(MIN_TASK_MINUTES, MAX_TASK_MINUTES);
                    }
                    warn!(week = week.week, total, allowed, "over-budget week scaled down");
                }
                ViolationKind::MissingVerification | ViolationKind::UnknownResource => {
                    // Content problems cannot be fixed by arithmetic.
                }
            }
        }
        plan
    }

    fn name(&self) -> &'static str {
        "clip-minutes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::tests::sample_plan;
    use crate::models::profile::LearningStyle;
    use std::collections::BTreeMap;

    fn profile(budget_hours: u32) -> Profile {
        Profile {
            user_id: "user_001".to_string(),
            years_total: 2.0,
            skills: BTreeMap::from([("JavaScript".to_string(), 4.0)]),
            projects: vec![],
            certifications: vec![],
            repos: vec![],
            time_budget_hours_per_week: budget_hours,
            learning_style: LearningStyle::Mixed,
        }
    }

    #[test]
    fn test_clean_plan_has_no_violations() {
        let plan = sample_plan("full_stack_engineer", "html_mdn");
        let violations = enforce(&plan, &profile(10), &ResourceCatalog::curated());
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_three_long_sessions_flagged_once_per_week() {
        // One week with three 150-minute tasks and two 60-minute tasks.
        // Weekly total is 570 minutes, inside a 10h budget with tolerance,
        // so the only violation is the long-session count.
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        for (i, day) in plan.weeks[0].days.iter_mut().enumerate() {
            day.tasks[0].est_time_minutes = if i < 3 { 150 } else { 60 };
        }

        let violations = enforce(&plan, &profile(10), &ResourceCatalog::curated());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].week, 1);
        assert_eq!(violations[0].kind, ViolationKind::LongSessionCount);
    }

    #[test]
    fn test_two_long_sessions_allowed() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[0].days[0].tasks[0].est_time_minutes = 150;
        plan.weeks[0].days[1].tasks[0].est_time_minutes = 150;

        let violations = enforce(&plan, &profile(10), &ResourceCatalog::curated());
        assert!(violations.is_empty());
    }

    #[test]
    fn test_short_acceptance_criterion_flagged() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[2].days[0].tasks[0].acceptance_criteria = vec!["done".to_string()];

        let violations = enforce(&plan, &profile(10), &ResourceCatalog::curated());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MissingVerification);
        assert_eq!(violations[0].week, 3);
    }

    #[test]
    fn test_unknown_resource_flagged() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[0].days[0].tasks[0].resources = vec!["udemy_course_42".to_string()];

        let violations = enforce(&plan, &profile(10), &ResourceCatalog::curated());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnknownResource);
        assert!(violations[0].detail.contains("udemy_course_42"));
    }

    #[test]
    fn test_budget_tolerance_boundary() {
        // 5h budget → 300 minutes, tolerance allows up to 360. The sample
        // plan has 5 x 60 = 300 minutes per week: within tolerance.
        let plan = sample_plan("full_stack_engineer", "html_mdn");
        assert!(enforce(&plan, &profile(5), &ResourceCatalog::curated()).is_empty());

        // 361 minutes in week 1 crosses it.
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[0].days[0].tasks[0].est_time_minutes = 121;
        let violations = enforce(&plan, &profile(5), &ResourceCatalog::curated());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::WeeklyBudgetExceeded);
    }

    #[test]
    fn test_enforce_never_mutates_the_plan() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[0].days[0].tasks[0].est_time_minutes = 200;
        plan.weeks[0].days[1].tasks[0].est_time_minutes = 200;
        plan.weeks[0].days[2].tasks[0].est_time_minutes = 200;
        let before = plan.clone();

        let _ = enforce(&plan, &profile(10), &ResourceCatalog::curated());
        assert_eq!(plan, before);
    }

    #[test]
    fn test_enforce_is_idempotent_on_valid_plans() {
        let plan = sample_plan("full_stack_engineer", "html_mdn");
        let profile = profile(10);
        let catalog = ResourceCatalog::curated();
        assert!(enforce(&plan, &profile, &catalog).is_empty());
        assert!(enforce(&plan, &profile, &catalog).is_empty());
    }

    #[test]
    fn test_report_only_policy_returns_plan_unchanged() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        plan.weeks[0].days[0].tasks[0].est_time_minutes = 200;
        let violations = vec![Violation {
            week: 1,
            kind: ViolationKind::LongSessionCount,
            detail: "test".to_string(),
        }];

        let result = ReportOnly.apply(plan.clone(), &profile(10), &violations);
        assert_eq!(result, plan);
    }

    #[test]
    fn test_clip_policy_caps_excess_long_sessions() {
        let mut plan = sample_plan("full_stack_engineer", "html_mdn");
        for day in plan.weeks[0].days.iter_mut().take(3) {
            day.tasks[0].est_time_minutes = 150;
        }
        let violations = enforce(&plan, &profile(10), &ResourceCatalog::curated());
        assert_eq!(violations.len(), 1);

        let clipped = ClipMinutes.apply(plan, &profile(10), &violations);
        let long = clipped.weeks[0]
            .days
            .iter()
            .flat_map(|d| d.tasks.iter())
            .filter(|t| t.est_time_minutes > LONG_SESSION_THRESHOLD_MINUTES)
            .count();
        assert_eq!(long, MAX_LONG_SESSIONS_PER_WEEK);
        // Structure untouched.
        assert_eq!(clipped.weeks[0].task_count(), 5);
        assert!(enforce(&clipped, &profile(10), &ResourceCatalog::curated()).is_empty());
    }
}
