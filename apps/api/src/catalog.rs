//! Curated learning-resource catalog. Every resource ID a plan references
//! must resolve here; the oracle flags unknown IDs as violations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

pub const CATALOG_FILE: &str = "resources.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
    /// Free-form kind label: "docs", "course", "book", "tutorial".
    pub kind: String,
    pub skills: Vec<String>,
    /// 1 = beginner, 5 = expert.
    pub difficulty: u8,
    pub estimated_hours: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCatalog {
    pub resources: BTreeMap<String, Resource>,
}

impl ResourceCatalog {
    pub fn load(data_dir: Option<&Path>) -> anyhow::Result<Self> {
        match data_dir.map(|d| d.join(CATALOG_FILE)) {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::curated()),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resource catalog from {}", path.display()))?;
        let catalog: ResourceCatalog = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid resource catalog JSON in {}", path.display()))?;
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    pub fn all_ids(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }

    /// Resources covering `skill`, optionally capped at a difficulty level.
    pub fn search(&self, skill: &str, max_difficulty: Option<u8>) -> Vec<(&str, &Resource)> {
        let wanted = skill.to_lowercase();
        self.resources
            .iter()
            .filter(|(_, r)| r.skills.iter().any(|s| s.to_lowercase() == wanted))
            .filter(|(_, r)| max_difficulty.map_or(true, |d| r.difficulty <= d))
            .map(|(id, r)| (id.as_str(), r))
            .collect()
    }

    /// Safe default resource for fallback plans. The catalog is never empty
    /// in practice, but an override file could be, so first-sorted-key is
    /// the last resort.
    pub fn fallback_resource(&self) -> Option<&str> {
        if self.contains("html_mdn") {
            return Some("html_mdn");
        }
        self.resources.keys().next().map(String::as_str)
    }

    pub fn curated() -> Self {
        fn res(
            title: &str,
            url: &str,
            kind: &str,
            skills: &[&str],
            difficulty: u8,
            estimated_hours: f32,
        ) -> Resource {
            Resource {
                title: title.to_string(),
                url: url.to_string(),
                kind: kind.to_string(),
                skills: skills.iter().map(|s| s.to_string()).collect(),
                difficulty,
                estimated_hours,
            }
        }

        let resources = BTreeMap::from([
            (
                "html_mdn".to_string(),
                res(
                    "MDN HTML Guide",
                    "https://developer.mozilla.org/en-US/docs/Learn/HTML",
                    "docs",
                    &["HTML5"],
                    1,
                    20.0,
                ),
            ),
            (
                "css_grid_guide".to_string(),
                res(
                    "A Complete Guide to CSS Grid",
                    "https://css-tricks.com/snippets/css/complete-guide-grid/",
                    "tutorial",
                    &["CSS3"],
                    2,
                    8.0,
                ),
            ),
            (
                "react_docs".to_string(),
                res(
                    "React Official Documentation",
                    "https://react.dev/learn",
                    "docs",
                    &["React", "JavaScript"],
                    2,
                    30.0,
                ),
            ),
            (
                "typescript_handbook".to_string(),
                res(
                    "The TypeScript Handbook",
                    "https://www.typescriptlang.org/docs/handbook/intro.html",
                    "docs",
                    &["TypeScript", "JavaScript"],
                    3,
                    15.0,
                ),
            ),
            (
                "python_official_tutorial".to_string(),
                res(
                    "The Python Tutorial",
                    "https://docs.python.org/3/tutorial/",
                    "docs",
                    &["Python"],
                    1,
                    25.0,
                ),
            ),
            (
                "sql_w3schools".to_string(),
                res(
                    "W3Schools SQL Tutorial",
                    "https://www.w3schools.com/sql/",
                    "tutorial",
                    &["SQL", "PostgreSQL", "MySQL"],
                    1,
                    12.0,
                ),
            ),
            (
                "rest_api_design".to_string(),
                res(
                    "REST API Design Best Practices",
                    "https://restfulapi.net/",
                    "docs",
                    &["REST API Design", "Node.js"],
                    3,
                    10.0,
                ),
            ),
            (
                "git_pro_book".to_string(),
                res(
                    "Pro Git",
                    "https://git-scm.com/book/en/v2",
                    "book",
                    &["Git"],
                    2,
                    18.0,
                ),
            ),
            (
                "docker_get_started".to_string(),
                res(
                    "Docker Get Started Guide",
                    "https://docs.docker.com/get-started/",
                    "docs",
                    &["Docker"],
                    2,
                    10.0,
                ),
            ),
            (
                "testing_js_guide".to_string(),
                res(
                    "JavaScript Testing Best Practices",
                    "https://github.com/goldbergyoni/javascript-testing-best-practices",
                    "tutorial",
                    &["Testing", "JavaScript"],
                    3,
                    14.0,
                ),
            ),
        ]);

        ResourceCatalog { resources }
    }
}
