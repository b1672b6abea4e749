use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Resource;
use crate::schema::{Field, FieldKind, KeyKind, TableSchema};

pub const SCHEMA: TableSchema = TableSchema {
    name: "projects",
    label: "project",
    key: KeyKind::Uuid,
    fields: &[
        Field::new("id", FieldKind::Key),
        Field::new(
            "profile",
            FieldKind::Reference {
                table: "profiles",
                key: KeyKind::Account,
            },
        ),
        Field::new("title", FieldKind::Text { max_len: Some(255) }),
        Field::new("description", FieldKind::Text { max_len: None }).optional(),
        Field::new("image_url", FieldKind::Url).optional(),
        Field::new("project_url", FieldKind::Url).optional(),
        Field::new("github_url", FieldKind::Url).optional(),
        // Comma-separated, e.g. "React, Node.js, PostgreSQL"
        Field::new("technologies", FieldKind::Text { max_len: None }).optional(),
        Field::new("created_at", FieldKind::CreatedAt),
        Field::new("updated_at", FieldKind::UpdatedAt),
    ],
    unique_together: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub profile: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub technologies: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Technologies split out of the comma-separated column
    pub fn technology_list(&self) -> Vec<&str> {
        self.technologies
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl Resource for Project {
    const SCHEMA: &'static TableSchema = &SCHEMA;

    fn summary(&self) -> Option<String> {
        Some(format!("{} [{}]", self.title, self.technology_list().join(", ")))
    }
}
