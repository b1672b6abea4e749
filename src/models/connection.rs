use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::VariantNames;
use strum_macros::{Display, VariantNames};
use uuid::Uuid;

use super::Resource;
use crate::schema::{Field, FieldDefault, FieldKind, KeyKind, TableSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Connected,
}

pub const SCHEMA: TableSchema = TableSchema {
    name: "connections",
    label: "connection",
    key: KeyKind::Uuid,
    fields: &[
        Field::new("id", FieldKind::Key),
        Field::new(
            "follower",
            FieldKind::Reference {
                table: "profiles",
                key: KeyKind::Account,
            },
        ),
        Field::new(
            "following",
            FieldKind::Reference {
                table: "profiles",
                key: KeyKind::Account,
            },
        ),
        Field::new("status", FieldKind::Choice(ConnectionStatus::VARIANTS))
            .with_default(FieldDefault::Str("connected")),
        Field::new("created_at", FieldKind::CreatedAt),
    ],
    unique_together: &[&["follower", "following"]],
};

/// Directed follow from one profile to another. Following yourself is not prevented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub follower: i64,
    pub following: i64,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    pub fn is_self_follow(&self) -> bool {
        self.follower == self.following
    }
}

impl Resource for Connection {
    const SCHEMA: &'static TableSchema = &SCHEMA;

    fn summary(&self) -> Option<String> {
        let label = if self.is_self_follow() {
            format!("{} follows itself", self.follower)
        } else {
            format!("{} follows {}", self.follower, self.following)
        };
        Some(label)
    }
}
