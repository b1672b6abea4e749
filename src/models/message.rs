use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Resource;
use crate::schema::{Field, FieldDefault, FieldKind, KeyKind, TableSchema};

pub const SCHEMA: TableSchema = TableSchema {
    name: "messages",
    label: "message",
    key: KeyKind::Uuid,
    fields: &[
        Field::new("id", FieldKind::Key),
        Field::new(
            "sender",
            FieldKind::Reference {
                table: "profiles",
                key: KeyKind::Account,
            },
        ),
        Field::new(
            "receiver",
            FieldKind::Reference {
                table: "profiles",
                key: KeyKind::Account,
            },
        ),
        Field::new("content", FieldKind::Text { max_len: None }),
        // Only the receiver flips this, through the read action
        Field::new("read", FieldKind::Boolean)
            .read_only()
            .with_default(FieldDefault::Bool(false)),
        Field::new("created_at", FieldKind::CreatedAt),
    ],
    unique_together: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: i64,
    pub receiver: i64,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_addressed_to(&self, profile_id: i64) -> bool {
        self.receiver == profile_id
    }
}

impl Resource for Message {
    const SCHEMA: &'static TableSchema = &SCHEMA;
}
