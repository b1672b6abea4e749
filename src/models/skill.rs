use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::VariantNames;
use strum_macros::{Display, EnumString, VariantNames};
use uuid::Uuid;

use super::Resource;
use crate::schema::{Field, FieldKind, KeyKind, TableSchema};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

pub const SCHEMA: TableSchema = TableSchema {
    name: "skills",
    label: "skill",
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
        Field::new("skill_name", FieldKind::Text { max_len: Some(255) }),
        Field::new("proficiency", FieldKind::Choice(Proficiency::VARIANTS)),
        Field::new("created_at", FieldKind::CreatedAt),
    ],
    unique_together: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub profile: i64,
    pub skill_name: String,
    pub proficiency: Proficiency,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.skill_name, self.proficiency)
    }
}

impl Resource for Skill {
    const SCHEMA: &'static TableSchema = &SCHEMA;

    fn summary(&self) -> Option<String> {
        Some(self.to_string())
    }
}
