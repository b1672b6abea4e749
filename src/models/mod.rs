//! Typed records for every resource and the table registry.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::schema::{Row, TableSchema};

pub mod connection;
pub mod endorsement;
pub mod message;
pub mod profile;
pub mod project;
pub mod skill;

pub use connection::{Connection, ConnectionStatus};
pub use endorsement::Endorsement;
pub use message::Message;
pub use profile::Profile;
pub use project::Project;
pub use skill::{Proficiency, Skill};

/// All resource tables, parents before children
pub const TABLES: &[&TableSchema] = &[
    &profile::SCHEMA,
    &skill::SCHEMA,
    &project::SCHEMA,
    &connection::SCHEMA,
    &message::SCHEMA,
    &endorsement::SCHEMA,
];

/// A record type backed by one table
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const SCHEMA: &'static TableSchema;

    fn from_row(row: Row) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(row))
    }

    /// Short label recorded when the record is created
    fn summary(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_parents_first() {
        let position = |name: &str| TABLES.iter().position(|t| t.name == name).unwrap();

        for table in TABLES {
            for (_, target, _) in table.references() {
                assert!(position(target) < position(table.name));
            }
        }
    }

    #[test]
    fn test_resource_schemas_are_registered() {
        for schema in [
            Profile::SCHEMA,
            Skill::SCHEMA,
            Project::SCHEMA,
            Connection::SCHEMA,
            Message::SCHEMA,
            Endorsement::SCHEMA,
        ] {
            assert!(TABLES.contains(&schema));
        }
    }
}
