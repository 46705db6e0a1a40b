//! Resume → profile extraction stage.

use tracing::warn;

use crate::errors::PipelineError;
use crate::llm_client::schemas::ProfileExtraction;
use crate::llm_client::{generate, GenerationFailure, StructuredGenerator, DEFAULT_MAX_ATTEMPTS};
use crate::models::profile::{Profile, MAX_WEEKLY_BUDGET_HOURS, MIN_WEEKLY_BUDGET_HOURS};
use crate::pipeline::prompts::{render, PROFILE_EXTRACTION_PROMPT_TEMPLATE};

/// Extracts a structured profile from resume text.
///
/// Persistent schema failures fall back to a conservative default profile
/// rather than aborting the run; transport failures propagate because the
/// rest of the pipeline needs the same capability anyway.
pub async fn extract_profile(
    generator: &dyn StructuredGenerator,
    resume_text: &str,
    user_id: &str,
) -> Result<Profile, PipelineError> {
    let prompt = render(
        PROFILE_EXTRACTION_PROMPT_TEMPLATE,
        &[("resume_text", resume_text)],
    );

    match generate::<ProfileExtraction>(generator, &prompt, DEFAULT_MAX_ATTEMPTS).await {
        Ok(extraction) => Ok(from_extraction(extraction, user_id)),
        Err(GenerationFailure::RetriesExhausted { attempts }) => {
            warn!(user_id, attempts, "profile extraction kept failing schema validation, using fallback profile");
            Ok(Profile::fallback(user_id))
        }
        Err(e @ GenerationFailure::Transport(_)) => Err(PipelineError::Generation {
            stage: "profile extraction",
            source: e,
        }),
    }
}

/// Attaches the user id and clamps the weekly budget to policy bounds.
fn from_extraction(extraction: ProfileExtraction, user_id: &str) -> Profile {
    Profile {
        user_id: user_id.to_string(),
        years_total: extraction.years_total,
        skills: extraction.skills,
        projects: extraction.projects,
        certifications: extraction.certifications,
        repos: extraction.repos,
        time_budget_hours_per_week: extraction
            .time_budget_hours_per_week
            .clamp(MIN_WEEKLY_BUDGET_HOURS, MAX_WEEKLY_BUDGET_HOURS),
        learning_style: extraction.learning_style,
    }
}
