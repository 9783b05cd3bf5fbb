use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Crew {
    pub id: String,
    pub company_id: String,
    pub name: String,
    /// Display only.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub home_zone_id: Option<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    pub max_hours_per_day: f64,
    pub max_jobs_per_day: u32,
    pub is_active: bool,
}

impl Crew {
    /// A crew without recorded specializations takes general work.
    pub fn is_generalist(&self) -> bool {
        self.specializations
            .iter()
            .all(|tag| normalize_tag(tag).is_empty())
    }
}

/// Specialization tags compare case-insensitively, ignoring surrounding
/// whitespace.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}
