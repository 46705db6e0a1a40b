//! User profile extracted from a resume: the contract between resume
//! ingestion and every downstream pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_WEEKLY_BUDGET_HOURS: u32 = 5;
pub const MAX_WEEKLY_BUDGET_HOURS: u32 = 40;
pub const DEFAULT_WEEKLY_BUDGET_HOURS: u32 = 10;

/// How the user prefers to learn. Drives plan-approach selection hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Project,
    Reading,
    Video,
    #[default]
    Mixed,
}

/// Normalized skill/experience profile.
///
/// Skill proficiency is a float in [1.0, 5.0]: the extractor rates with
/// decimals (e.g. React 4.5 for a lead contributor), and dependency
/// inference downstream produces fractional levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub years_total: f32,
    pub skills: BTreeMap<String, f32>,
    pub projects: Vec<String>,
    pub certifications: Vec<String>,
    pub repos: Vec<String>,
    pub time_budget_hours_per_week: u32,
    pub learning_style: LearningStyle,
}

impl Profile {
    /// Conservative fallback when resume extraction keeps producing
    /// non-conformant output: minimal skills, default budget.
    pub fn fallback(user_id: &str) -> Self {
        Profile {
            user_id: user_id.to_string(),
            years_total: 1.0,
            skills: BTreeMap::from([("Programming".to_string(), 2.0)]),
            projects: vec![],
            certifications: vec![],
            repos: vec![],
            time_budget_hours_per_week: DEFAULT_WEEKLY_BUDGET_HOURS,
            learning_style: LearningStyle::Mixed,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.years_total < 0.0 {
            return Err(format!("years_total must be >= 0, got {}", self.years_total));
        }
        for (skill, level) in &self.skills {
            if !(1.0..=5.0).contains(level) {
                return Err(format!(
                    "skill level for '{skill}' must be within [1, 5], got {level}"
                ));
            }
        }
        if !(MIN_WEEKLY_BUDGET_HOURS..=MAX_WEEKLY_BUDGET_HOURS)
            .contains(&self.time_budget_hours_per_week)
        {
            return Err(format!(
                "time budget must be within [{MIN_WEEKLY_BUDGET_HOURS}, {MAX_WEEKLY_BUDGET_HOURS}] hours, got {}",
                self.time_budget_hours_per_week
            ));
        }
        Ok(())
    }

    /// Case-insensitive skill lookup.
    pub fn skill_level(&self, skill: &str) -> Option<f32> {
        let wanted = skill.to_lowercase();
        self.skills
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(_, level)| *level)
    }
}
