//! Role skill requirements and the skill dependency graph.
//!
//! Roles map skill names to target proficiency levels; the dependency map
//! records which skills imply competence in others (knowing React implies
//! working HTML5/CSS3/JavaScript). Both ship with curated defaults and can
//! be overridden from a JSON file in the data directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

pub const SKILL_GRAPH_FILE: &str = "skill_graph.json";

/// How strongly a role depends on a skill. Drives effort weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub target_level: f32,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub title: String,
    pub skills: BTreeMap<String, SkillRequirement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGraph {
    pub roles: BTreeMap<String, RoleDefinition>,
    /// Skill → skills it implies, keyed lowercase.
    pub dependencies: BTreeMap<String, Vec<String>>,
}

impl SkillGraph {
    /// Loads from `<data_dir>/skill_graph.json` when present, otherwise
    /// falls back to the curated defaults.
    pub fn load(data_dir: Option<&Path>) -> anyhow::Result<Self> {
        match data_dir.map(|d| d.join(SKILL_GRAPH_FILE)) {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::curated()),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read skill graph from {}", path.display()))?;
        let graph: SkillGraph = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid skill graph JSON in {}", path.display()))?;
        Ok(graph)
    }

    pub fn get_role(&self, role_id: &str) -> Option<&RoleDefinition> {
        self.roles.get(role_id)
    }

    pub fn list_roles(&self) -> Vec<&str> {
        self.roles.keys().map(String::as_str).collect()
    }

    /// Skills implied by `skill`, or empty when it has no dependencies.
    pub fn depends_on(&self, skill: &str) -> &[String] {
        self.dependencies
            .get(&skill.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn curated() -> Self {
        fn req(target_level: f32, priority: Priority) -> SkillRequirement {
            SkillRequirement {
                target_level,
                priority,
            }
        }

        let frontend = RoleDefinition {
            title: "Frontend Engineer".to_string(),
            skills: BTreeMap::from([
                ("HTML5".to_string(), req(4.0, Priority::High)),
                ("CSS3".to_string(), req(4.0, Priority::High)),
                ("JavaScript".to_string(), req(4.0, Priority::High)),
                ("React".to_string(), req(4.0, Priority::High)),
                ("TypeScript".to_string(), req(3.0, Priority::Medium)),
                ("Testing".to_string(), req(3.0, Priority::Medium)),
                ("Git".to_string(), req(3.0, Priority::Medium)),
            ]),
        };

        let full_stack = RoleDefinition {
            title: "Full Stack Engineer".to_string(),
            skills: BTreeMap::from([
                ("HTML5".to_string(), req(4.0, Priority::High)),
                ("CSS3".to_string(), req(3.0, Priority::Medium)),
                ("JavaScript".to_string(), req(4.0, Priority::High)),
                ("React".to_string(), req(4.0, Priority::High)),
                ("Node.js".to_string(), req(4.0, Priority::High)),
                ("Express.js".to_string(), req(3.0, Priority::Medium)),
                ("SQL".to_string(), req(4.0, Priority::High)),
                ("PostgreSQL".to_string(), req(3.0, Priority::Medium)),
                ("REST API Design".to_string(), req(4.0, Priority::High)),
                ("Docker".to_string(), req(3.0, Priority::Medium)),
                ("Testing".to_string(), req(3.0, Priority::Medium)),
                ("Git".to_string(), req(3.0, Priority::Medium)),
            ]),
        };

        let dependencies = BTreeMap::from([
            (
                "react".to_string(),
                vec![
                    "javascript".to_string(),
                    "html5".to_string(),
                    "css3".to_string(),
                ],
            ),
            (
                "vue.js".to_string(),
                vec![
                    "javascript".to_string(),
                    "html5".to_string(),
                    "css3".to_string(),
                ],
            ),
            ("next.js".to_string(), vec!["react".to_string()]),
            ("typescript".to_string(), vec!["javascript".to_string()]),
            ("node.js".to_string(), vec!["javascript".to_string()]),
            ("express.js".to_string(), vec!["node.js".to_string()]),
            ("postgresql".to_string(), vec!["sql".to_string()]),
            ("mysql".to_string(), vec!["sql".to_string()]),
            ("sass".to_string(), vec!["css3".to_string()]),
            ("scss".to_string(), vec!["css3".to_string()]),
        ]);

        SkillGraph {
            roles: BTreeMap::from([
                ("frontend_engineer".to_string(), frontend),
                ("full_stack_engineer".to_string(), full_stack),
            ]),
            dependencies,
        }
    }
}
