use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Resource;
use crate::schema::{Field, FieldDefault, FieldKind, KeyKind, TableSchema};

pub const SCHEMA: TableSchema = TableSchema {
    name: "profiles",
    label: "profile",
    key: KeyKind::Account,
    fields: &[
        Field::new("id", FieldKind::Key),
        Field::new("email", FieldKind::Email),
        Field::new("full_name", FieldKind::Text { max_len: Some(255) }).optional(),
        Field::new("bio", FieldKind::Text { max_len: None }).optional(),
        Field::new("avatar_url", FieldKind::Url).optional(),
        Field::new("location", FieldKind::Text { max_len: Some(255) }).optional(),
        Field::new("website", FieldKind::Url).optional(),
        Field::new("github_url", FieldKind::Url).optional(),
        Field::new("linkedin_url", FieldKind::Url).optional(),
        Field::new("twitter_url", FieldKind::Url).optional(),
        Field::new("years_experience", FieldKind::Integer).optional(),
        Field::new("open_to_work", FieldKind::Boolean).with_default(FieldDefault::Bool(false)),
        Field::new("created_at", FieldKind::CreatedAt),
        Field::new("updated_at", FieldKind::UpdatedAt),
    ],
    unique_together: &[],
};

/// Developer profile, keyed by the id of the account that owns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub years_experience: Option<i32>,
    pub open_to_work: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Full name when set, otherwise the id
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.id.to_string(),
        }
    }
}

impl Resource for Profile {
    const SCHEMA: &'static TableSchema = &SCHEMA;

    fn summary(&self) -> Option<String> {
        Some(self.display_name())
    }
}
