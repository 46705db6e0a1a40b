//! Skill-gap records produced by gap analysis. Computed fresh per run,
//! never persisted independently.

use serde::{Deserialize, Serialize};

/// Classification of a single required skill against the assessed level.
/// Thresholds partition the real line: met ≤ 1.0 < partial < 4.0 ≤ missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapStatus {
    Met,
    Partial,
    Missing,
}

/// A deficiency between a target proficiency and the assessed
/// (explicit-or-inferred) level. A record only exists when need > have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill: String,
    pub have: u8,
    pub need: u8,
    pub status: GapStatus,
    pub confidence: f32,
    pub evidence: Vec<String>,
    pub effort_hours: u32,
    pub prereqs: Vec<String>,
}

impl SkillGap {
    pub fn validate(&self) -> Result<(), String> {
        if self.have > 5 {
            return Err(format!("have level must be within [0, 5], got {}", self.have));
        }
        if !(1..=5).contains(&self.need) {
            return Err(format!("need level must be within [1, 5], got {}", self.need));
        }
        if self.need <= self.have {
            return Err(format!(
                "'{}': need ({}) must exceed have ({}); gap records only exist for deficiencies",
                self.skill, self.need, self.have
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            ));
        }
        if !(1..=100).contains(&self.effort_hours) {
            return Err(format!(
                "effort_hours must be within [1, 100], got {}",
                self.effort_hours
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap() -> SkillGap {
        SkillGap {
            skill: "Docker".to_string(),
            have: 0,
            need: 3,
            status: GapStatus::Missing,
            confidence: 0.8,
            evidence: vec!["no explicit or inferred signal".to_string()],
            effort_hours: 24,
            prereqs: vec![],
        }
    }

    #[test]
    fn test_valid_gap_passes() {
        assert!(gap().validate().is_ok());
    }

    #[test]
    fn test_need_must_exceed_have() {
        let mut g = gap();
        g.have = 3;
        g.need = 3;
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        let mut g = gap();
        g.confidence = 1.5;
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_effort_hours_bounds() {
        let mut g = gap();
        g.effort_hours = 0;
        assert!(g.validate().is_err());
        g.effort_hours = 101;
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&GapStatus::Partial).unwrap(),
            r#""partial""#
        );
    }
}
