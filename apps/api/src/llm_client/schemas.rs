//! Named, versioned output schemas for structured generation.
//!
//! Every LLM call in the pipeline is bound to exactly one of these types.
//! `validate` holds the semantic constraints that `serde` cannot express;
//! once a value passes, downstream code treats it as trusted input.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::gap::SkillGap;
use crate::models::plan::LearningPlan;
use crate::models::profile::LearningStyle;

/// Contract for structured LLM output. `shape` is the field description
/// embedded in the system prompt; `validate` rejects values that parse
/// but violate semantic bounds.
pub trait StructuredSchema: DeserializeOwned + Send {
    const NAME: &'static str;
    const VERSION: u32;
    fn shape() -> &'static str;
    fn validate(&self) -> Result<(), String>;
}

// ────────────────────────────────────────────────────────────────────────────
// Profile extraction
// ────────────────────────────────────────────────────────────────────────────

/// Raw output of resume parsing, before a user_id is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileExtraction {
    pub years_total: f32,
    pub skills: BTreeMap<String, f32>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub repos: Vec<String>,
    pub time_budget_hours_per_week: u32,
    #[serde(default)]
    pub learning_style: LearningStyle,
}

impl StructuredSchema for ProfileExtraction {
    const NAME: &'static str = "profile_extraction";
    const VERSION: u32 = 1;

    fn shape() -> &'static str {
        r#"{
  "years_total": <number, total years of professional experience>,
  "skills": {"<skill name>": <proficiency 1.0-5.0>, ...},
  "projects": ["<project description>", ...],
  "certifications": ["<certification>", ...],
  "repos": ["<repository url or name>", ...],
  "time_budget_hours_per_week": <integer, hours available per week>,
  "learning_style": "project" | "reading" | "video" | "mixed"
}"#
    }

    fn validate(&self) -> Result<(), String> {
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
        // Budget is clamped to policy bounds downstream, but zero means the
        // model failed to find any signal at all.
        if self.time_budget_hours_per_week == 0 {
            return Err("time_budget_hours_per_week must be positive".to_string());
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gap analysis
// ────────────────────────────────────────────────────────────────────────────

/// Gap list shape shared by the deterministic analyzer (serialization into
/// the planner prompt) and plan-stage parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapAnalysisResult {
    pub gaps: Vec<SkillGap>,
}

impl StructuredSchema for GapAnalysisResult {
    const NAME: &'static str = "gap_analysis";
    const VERSION: u32 = 1;

    fn shape() -> &'static str {
        r#"{
  "gaps": [
    {
      "skill": "<skill name>",
      "have": <integer 0-5>,
      "need": <integer 1-5, greater than have>,
      "status": "met" | "partial" | "missing",
      "confidence": <number 0.0-1.0>,
      "evidence": ["<reason>", ...],
      "effort_hours": <integer 1-100>,
      "prereqs": ["<skill name>", ...]
    }
  ]
}"#
    }

    fn validate(&self) -> Result<(), String> {
        for gap in &self.gaps {
            gap.validate()?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Plan generation
// ────────────────────────────────────────────────────────────────────────────

/// A candidate learning plan as returned by one generation approach.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanCandidate(pub LearningPlan);

impl StructuredSchema for PlanCandidate {
    const NAME: &'static str = "learning_plan";
    const VERSION: u32 = 1;

    fn shape() -> &'static str {
        r#"{
  "role": "<target role id>",
  "weeks": [
    {
      "week": <integer 1-12, sequential>,
      "theme": "<week theme>",
      "goals": ["<goal>", ...1 to 3 items],
      "deliverable": "<concrete weekly deliverable>",
      "days": [
        {
          "day": <integer, 1-based day index>,
          "tasks": [
            {
              "id": "w<week>d<day>t<ordinal>",
              "skill": "<skill name>",
              "activity_type": "reading" | "video" | "exercise" | "project" | "review" | "assessment",
              "description": "<what to do>",
              "est_time_minutes": <integer 15-240>,
              "acceptance_criteria": ["<verifiable criterion>", ...],
              "resources": ["<resource id from the provided catalog>", ...]
            }
          ]
        }
      ...5 to 7 days per week],
      "assessment": {"type": "<kind>", "instructions": "<text>", "estimated_hours": <number>} | omitted
    }
  ...exactly 12 weeks],
  "coaching_tips": ["<tip>", ...3 to 10 items],
  "checkpoints": {"4": "<milestone>", "8": "<milestone>", "12": "<milestone>"}
}"#
    }

    fn validate(&self) -> Result<(), String> {
        self.0.validate_structure()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Plan evaluation
// ────────────────────────────────────────────────────────────────────────────

/// Comparative judgment across plan candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEvaluation {
    pub best_plan_index: usize,
    pub reasoning: String,
    pub scores: Vec<f32>,
}

impl StructuredSchema for PlanEvaluation {
    const NAME: &'static str = "plan_evaluation";
    const VERSION: u32 = 1;

    fn shape() -> &'static str {
        r#"{
  "best_plan_index": <0-based index of the strongest candidate>,
  "reasoning": "<one short paragraph justifying the choice>",
  "scores": [<number 0.0-10.0 per candidate, in input order>]
}"#
    }

    fn validate(&self) -> Result<(), String> {
        if self.reasoning.trim().is_empty() {
            return Err("reasoning must be non-empty".to_string());
        }
        if self.scores.is_empty() {
            return Err("scores must list one entry per candidate".to_string());
        }
        if self.best_plan_index >= self.scores.len() {
            return Err(format!(
                "best_plan_index {} out of range for {} scores",
                self.best_plan_index,
                self.scores.len()
            ));
        }
        if self.scores.iter().any(|s| !(0.0..=10.0).contains(s)) {
            return Err("scores must be within [0, 10]".to_string());
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Coaching enhancement
// ────────────────────────────────────────────────────────────────────────────

/// Extra personalization tips appended by the final pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingEnhancement {
    pub additional_coaching_tips: Vec<String>,
}

impl StructuredSchema for CoachingEnhancement {
    const NAME: &'static str = "coaching_enhancement";
    const VERSION: u32 = 1;

    fn shape() -> &'static str {
        r#"{
  "additional_coaching_tips": ["<specific, actionable tip>", ...1 to 8 items]
}"#
    }

    fn validate(&self) -> Result<(), String> {
        if self.additional_coaching_tips.is_empty() || self.additional_coaching_tips.len() > 8 {
            return Err(format!(
                "must have 1-8 tips, got {}",
                self.additional_coaching_tips.len()
            ));
        }
        if self.additional_coaching_tips.iter().any(|t| t.trim().is_empty()) {
            return Err("tips must be non-empty".to_string());
        }
        Ok(())
    }
}
