//! Roadmap generation pipeline.
//!
//! Stages run strictly in sequence: profile extraction → gap analysis →
//! plan generation → evaluation → constraint enforcement → personalization.
//! Profile extraction (transport), gap analysis, and plan generation
//! failures are fatal; constraint violations and finalization failures are
//! absorbed and reported alongside the plan.

use std::sync::Arc;

use tracing::info;

use crate::catalog::ResourceCatalog;
use crate::errors::PipelineError;
use crate::llm_client::StructuredGenerator;
use crate::models::gap::SkillGap;
use crate::models::plan::LearningPlan;
use crate::models::profile::Profile;
use crate::pipeline::oracle::{Violation, ViolationPolicy};
use crate::skill_graph::SkillGraph;

pub mod critic;
pub mod finalizer;
pub mod gaps;
pub mod handlers;
pub mod oracle;
pub mod planner;
pub mod profile;
pub mod prompts;

/// Everything a completed run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub profile: Profile,
    pub gaps: Vec<SkillGap>,
    pub plan: LearningPlan,
    pub violations: Vec<Violation>,
}

/// The orchestrator. All collaborators are injected once at startup and
/// shared read-only across concurrent runs.
pub struct Pipeline {
    llm: Arc<dyn StructuredGenerator>,
    skill_graph: Arc<SkillGraph>,
    catalog: Arc<ResourceCatalog>,
    policy: Arc<dyn ViolationPolicy>,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn StructuredGenerator>,
        skill_graph: Arc<SkillGraph>,
        catalog: Arc<ResourceCatalog>,
        policy: Arc<dyn ViolationPolicy>,
    ) -> Self {
        Self {
            llm,
            skill_graph,
            catalog,
            policy,
        }
    }

    pub fn skill_graph(&self) -> &SkillGraph {
        &self.skill_graph
    }

    /// Runs the full pipeline for one user and target role.
    pub async fn run(
        &self,
        resume_text: &str,
        target_role: &str,
        user_id: &str,
    ) -> Result<PipelineOutcome, PipelineError> {
        // Fail before spending any LLM budget on an unknown role.
        if self.skill_graph.get_role(target_role).is_none() {
            return Err(PipelineError::RoleNotFound(target_role.to_string()));
        }

        info!(user_id, role = target_role, "pipeline run started");

        let profile = profile::extract_profile(self.llm.as_ref(), resume_text, user_id).await?;
        info!(
            skills = profile.skills.len(),
            budget_hours = profile.time_budget_hours_per_week,
            "profile extracted"
        );

        let gap_list = gaps::analyze_gaps(&self.skill_graph, &profile, target_role)?;
        info!(gaps = gap_list.len(), "gap analysis complete");

        let candidates = planner::generate_plans(
            self.llm.as_ref(),
            &profile,
            &gap_list,
            target_role,
            &self.catalog,
        )
        .await?;
        info!(candidates = candidates.len(), "plan candidates generated");

        let plan = critic::evaluate(self.llm.as_ref(), &profile, &gap_list, candidates)
            .await
            .unwrap_or_else(|| planner::fallback_plan(target_role, &gap_list, &self.catalog));

        let violations = oracle::enforce(&plan, &profile, &self.catalog);
        info!(
            violations = violations.len(),
            policy = self.policy.name(),
            "constraints checked"
        );
        let plan = self.policy.apply(plan, &profile, &violations);

        let plan = finalizer::personalize(self.llm.as_ref(), plan, &profile).await;

        info!(user_id, role = target_role, "pipeline run complete");

        Ok(PipelineOutcome {
            profile,
            gaps: gap_list,
            plan,
            violations,
        })
    }
}
