use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Resource;
use crate::schema::{Field, FieldKind, KeyKind, TableSchema};

pub const SCHEMA: TableSchema = TableSchema {
    name: "endorsements",
    label: "endorsement",
    key: KeyKind::Uuid,
    fields: &[
        Field::new("id", FieldKind::Key),
        Field::new(
            "endorser",
            FieldKind::Reference {
                table: "profiles",
                key: KeyKind::Account,
            },
        ),
        Field::new(
            "endorsee",
            FieldKind::Reference {
                table: "profiles",
                key: KeyKind::Account,
            },
        ),
        Field::new(
            "skill",
            FieldKind::Reference {
                table: "skills",
                key: KeyKind::Uuid,
            },
        ),
        Field::new("created_at", FieldKind::CreatedAt),
    ],
    unique_together: &[&["endorser", "endorsee", "skill"]],
};

/// One profile vouching for another profile's skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endorsement {
    pub id: Uuid,
    pub endorser: i64,
    pub endorsee: i64,
    pub skill: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Resource for Endorsement {
    const SCHEMA: &'static TableSchema = &SCHEMA;
}
