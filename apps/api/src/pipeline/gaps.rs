//! Deterministic gap analysis.
//!
//! No LLM call here: gap arithmetic has exact required properties
//! (inference factor, thresholds, monotonicity) that a stochastic stage
//! cannot guarantee. The skill graph and profile fully determine the output.

use std::collections::BTreeMap;

use tracing::debug;

use crate::errors::PipelineError;
use crate::models::gap::{GapStatus, SkillGap};
use crate::models::profile::Profile;
use crate::skill_graph::{Priority, SkillGraph};

/// Inferred dependency proficiency is this fraction of the implying
/// skill's level, compounding per hop.
pub const DEPENDENCY_INFERENCE_FACTOR: f32 = 0.9;
/// gap <= MET_THRESHOLD counts as met; gap >= MISSING_THRESHOLD as missing.
pub const MET_THRESHOLD: f32 = 1.0;
pub const MISSING_THRESHOLD: f32 = 4.0;
/// Estimated hours to close one proficiency level, by priority.
const HOURS_PER_LEVEL_HIGH: f32 = 12.0;
const HOURS_PER_LEVEL_MEDIUM: f32 = 8.0;

/// Classification of one required skill against the effective level.
#[derive(Debug, Clone)]
pub struct SkillAssessment {
    pub skill: String,
    pub priority: Priority,
    pub target_level: f32,
    /// max(explicit, inferred); 0.0 when the profile shows no signal.
    pub effective_level: f32,
    pub gap: f32,
    pub status: GapStatus,
    pub explicit: bool,
    pub inferred_from: Vec<String>,
}

/// Effective proficiency per skill (lowercase key): explicit resume levels
/// plus levels inferred along dependency edges. Explicit levels are never
/// downgraded; inference takes the max over all implying skills; the factor
/// compounds per hop on transitive chains.
pub fn infer_levels(graph: &SkillGraph, profile: &Profile) -> BTreeMap<String, InferredLevel> {
    let mut levels: BTreeMap<String, InferredLevel> = BTreeMap::new();

    for (skill, &level) in &profile.skills {
        levels.insert(
            skill.to_lowercase(),
            InferredLevel {
                level: level.min(5.0),
                explicit: true,
                sources: vec![],
            },
        );
    }

    // Propagate from each explicit skill. A skill only re-propagates when
    // its level strictly improves on what was already propagated from it,
    // so the loop reaches a fixed point even if the override file ships a
    // cyclic dependency graph.
    let mut worklist: Vec<(String, f32, String)> = profile
        .skills
        .iter()
        .map(|(skill, &level)| (skill.to_lowercase(), level.min(5.0), skill.to_lowercase()))
        .collect();
    let mut propagated: BTreeMap<String, f32> = BTreeMap::new();

    while let Some((skill, level, origin)) = worklist.pop() {
        match propagated.get(&skill) {
            Some(&prev) if prev >= level => continue,
            _ => {
                propagated.insert(skill.clone(), level);
            }
        }
        for dep in graph.depends_on(&skill) {
            let implied = (level * DEPENDENCY_INFERENCE_FACTOR).min(5.0);
            let entry = levels.entry(dep.clone()).or_insert(InferredLevel {
                level: 0.0,
                explicit: false,
                sources: vec![],
            });
            // Never downgrade; record the origin only when it raises the level.
            if !entry.explicit && implied > entry.level {
                entry.level = implied;
                entry.sources = vec![origin.clone()];
            }
            // Explicit dependencies were seeded at their own level, so the
            // implied value is all that remains to carry forward.
            worklist.push((dep.clone(), implied, origin.clone()));
        }
    }

    levels
}

#[derive(Debug, Clone)]
pub struct InferredLevel {
    pub level: f32,
    pub explicit: bool,
    /// Explicit skills this level was inferred from (empty when explicit).
    pub sources: Vec<String>,
}

/// Classifies every skill the role requires. Fails fast on an unknown role.
pub fn assess_role(
    graph: &SkillGraph,
    profile: &Profile,
    role_id: &str,
) -> Result<Vec<SkillAssessment>, PipelineError> {
    let role = graph
        .get_role(role_id)
        .ok_or_else(|| PipelineError::RoleNotFound(role_id.to_string()))?;

    let levels = infer_levels(graph, profile);

    let mut assessments: Vec<SkillAssessment> = role
        .skills
        .iter()
        .map(|(skill, requirement)| {
            let inferred = levels.get(&skill.to_lowercase());
            let effective_level = inferred.map(|l| l.level).unwrap_or(0.0);
            let gap = requirement.target_level - effective_level;
            let status = if gap <= MET_THRESHOLD {
                GapStatus::Met
            } else if gap >= MISSING_THRESHOLD {
                GapStatus::Missing
            } else {
                GapStatus::Partial
            };
            SkillAssessment {
                skill: skill.clone(),
                priority: requirement.priority,
                target_level: requirement.target_level,
                effective_level,
                gap,
                status,
                explicit: inferred.map(|l| l.explicit).unwrap_or(false),
                inferred_from: inferred.map(|l| l.sources.clone()).unwrap_or_default(),
            }
        })
        .collect();

    // High-priority first, then widest gap.
    assessments.sort_by(|a, b| {
        let rank = |p: Priority| match p {
            Priority::High => 0,
            Priority::Medium => 1,
        };
        rank(a.priority)
            .cmp(&rank(b.priority))
            .then(b.gap.total_cmp(&a.gap))
    });

    Ok(assessments)
}

/// Actionable skill gaps for `role_id`: only skills whose gap exceeds the
/// met threshold. Met skills (including inferred-met) produce no record.
pub fn analyze_gaps(
    graph: &SkillGraph,
    profile: &Profile,
    role_id: &str,
) -> Result<Vec<SkillGap>, PipelineError> {
    let assessments = assess_role(graph, profile, role_id)?;

    let gaps: Vec<SkillGap> = assessments
        .iter()
        .filter(|a| a.gap > MET_THRESHOLD)
        .map(|a| to_gap(graph, &assessments, a))
        .collect();

    debug!(
        role = role_id,
        required = assessments.len(),
        gaps = gaps.len(),
        "gap analysis complete"
    );

    Ok(gaps)
}

fn to_gap(graph: &SkillGraph, assessments: &[SkillAssessment], a: &SkillAssessment) -> SkillGap {
    let hours_per_level = match a.priority {
        Priority::High => HOURS_PER_LEVEL_HIGH,
        Priority::Medium => HOURS_PER_LEVEL_MEDIUM,
    };
    let effort_hours = (a.gap * hours_per_level).ceil().clamp(1.0, 100.0) as u32;

    let (confidence, evidence) = if a.explicit {
        (
            0.9,
            vec![format!(
                "resume rates {} at {:.1}, role needs {:.1}",
                a.skill, a.effective_level, a.target_level
            )],
        )
    } else if !a.inferred_from.is_empty() {
        (
            0.7,
            vec![format!(
                "level {:.1} inferred from {}",
                a.effective_level,
                a.inferred_from.join(", ")
            )],
        )
    } else {
        (
            0.5,
            vec!["no explicit or inferred signal in profile".to_string()],
        )
    };

    // Dependencies of this skill that are themselves unmet become explicit
    // prerequisites so the planner can order weeks correctly.
    let prereqs: Vec<String> = graph
        .depends_on(&a.skill)
        .iter()
        .filter(|dep| {
            assessments
                .iter()
                .any(|other| other.skill.to_lowercase() == **dep && other.gap > MET_THRESHOLD)
        })
        .cloned()
        .collect();

    SkillGap {
        skill: a.skill.clone(),
        have: a.effective_level.floor().max(0.0) as u8,
        need: a.target_level.round() as u8,
        status: a.status,
        confidence,
        evidence,
        effort_hours,
        prereqs,
    }
}
