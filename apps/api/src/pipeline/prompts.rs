//! Prompt templates for the roadmap pipeline. Placeholders use
//! `{snake_case}` markers substituted with `str::replace`.

pub const PROFILE_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract a structured skill profile from the resume below.

Rate each identifiable technical skill from 1.0 (novice) to 5.0 (expert) based on
evidence in the resume: years of use, depth of project work, leadership of technical
efforts. Be conservative when evidence is thin. Estimate total years of professional
experience, list notable projects, certifications, and public repositories.

If the resume states how many hours per week the person can dedicate to learning,
use that number for time_budget_hours_per_week; otherwise estimate 10. Infer the
learning style (project / reading / video / mixed) from how the person describes
their work, defaulting to mixed.

RESUME:
{resume_text}
"#;

pub const PLAN_PROMPT_TEMPLATE: &str = r#"Design a 12-week learning plan that closes the skill gaps below for the target role.

TARGET ROLE: {role}

APPROACH: {approach}
{guidance}

USER PROFILE:
{profile_json}

SKILL GAPS (ordered by priority):
{gaps_json}

AVAILABLE RESOURCE IDS (tasks may ONLY reference these):
{resource_ids_json}

Requirements:
- Exactly 12 weeks, numbered 1 through 12, each with a theme, 1-3 goals, and a
  concrete weekly deliverable.
- 5 to 7 days of tasks per week. Task IDs follow the pattern w<week>d<day>t<ordinal>.
- Each task: 15-240 minutes, at least one verifiable acceptance criterion, and at
  least one resource ID from the list above.
- Respect the user's weekly time budget of {budget_hours} hours; prefer many short
  sessions over few long ones.
- Include checkpoints at weeks 4, 8 and 12 and 3-10 coaching tips.
- Address high-priority gaps before medium-priority ones, honoring prerequisite
  skills first.
"#;

pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are reviewing {candidate_count} candidate learning plans for the same user and target role.

USER PROFILE:
{profile_json}

SKILL GAPS:
{gaps_json}

CANDIDATE PLANS (JSON array, index order matters):
{plans_json}

Judge each candidate on: coverage of the listed gaps, pacing against the user's
weekly time budget, prerequisite ordering, and concreteness of deliverables and
acceptance criteria. Score every candidate and pick the single strongest one.
"#;

pub const COACHING_PROMPT_TEMPLATE: &str = r#"The learning plan below was generated for this user. Add personalized coaching tips that the generic plan is missing.

USER PROFILE:
{profile_json}

PLAN SUMMARY (themes and deliverables per week):
{plan_summary}

EXISTING TIPS:
{existing_tips_json}

Suggest specific, actionable tips grounded in the user's background and learning
style. Do not repeat existing tips.
"#;

/// Substitutes `{key}` markers. Single-pass replace per pair.
pub fn render(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in pairs {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_markers() {
        let rendered = render(
            PROFILE_EXTRACTION_PROMPT_TEMPLATE,
            &[("resume_text", "Jane Doe, frontend developer")],
        );
        assert!(rendered.contains("Jane Doe"));
        assert!(!rendered.contains("{resume_text}"));
    }

    #[test]
    fn test_plan_prompt_contains_constraints() {
        let rendered = render(
            PLAN_PROMPT_TEMPLATE,
            &[
                ("role", "full_stack_engineer"),
                ("approach", "Balanced"),
                ("guidance", "Mix theory and practice evenly."),
                ("profile_json", "{}"),
                ("gaps_json", "[]"),
                ("resource_ids_json", r#"["html_mdn"]"#),
                ("budget_hours", "10"),
            ],
        );
        assert!(rendered.contains("Exactly 12 weeks"));
        assert!(rendered.contains("15-240 minutes"));
        assert!(rendered.contains("10 hours"));
    }
}
