use super::{
    validation::missing_reference_error, FieldDefault, FieldErrors, FieldKind, KeyKind, Row,
    TableSchema,
};

/// Table that owns account-keyed rows
pub const ACCOUNTS_TABLE: &str = "accounts";

fn key_sql_type(key: KeyKind) -> &'static str {
    match key {
        KeyKind::Account => "BIGINT",
        KeyKind::Uuid => "UUID",
    }
}

impl TableSchema {
    fn pkey_constraint(&self) -> String {
        format!("{}_pkey", self.name)
    }

    fn fkey_constraint(&self, field: &str) -> String {
        format!("{}_{}_fkey", self.name, field)
    }

    fn check_constraint(&self, field: &str) -> String {
        format!("{}_{}_check", self.name, field)
    }

    fn unique_constraint(&self, group: &[&str]) -> String {
        format!("{}_{}_key", self.name, group.join("_"))
    }

    /// Postgres DDL for this table. Constraint names are fixed so violations can be traced
    /// back to a column with [`TableSchema::constraint_errors`].
    pub fn create_table_sql(&self) -> String {
        let mut lines = Vec::new();
        let mut constraints = Vec::new();

        for field in self.fields {
            let sql_type = match field.kind {
                FieldKind::Key => key_sql_type(self.key).to_string(),
                FieldKind::Text { max_len: Some(n) } => format!("VARCHAR({})", n),
                FieldKind::Text { max_len: None } => "TEXT".to_string(),
                FieldKind::Email => "VARCHAR(254)".to_string(),
                FieldKind::Url => "VARCHAR(200)".to_string(),
                FieldKind::Integer => "INTEGER".to_string(),
                FieldKind::Boolean => "BOOLEAN".to_string(),
                FieldKind::Choice(_) => "VARCHAR(20)".to_string(),
                FieldKind::Reference { key, .. } => key_sql_type(key).to_string(),
                FieldKind::CreatedAt | FieldKind::UpdatedAt => "TIMESTAMPTZ".to_string(),
            };

            let mut line = format!("    {} {}", field.name, sql_type);
            if !field.nullable {
                line.push_str(" NOT NULL");
            }
            match field.default {
                Some(FieldDefault::Bool(b)) => line.push_str(&format!(" DEFAULT {}", b)),
                Some(FieldDefault::Str(s)) => line.push_str(&format!(" DEFAULT '{}'", s)),
                None => {}
            }
            lines.push(line);

            match field.kind {
                FieldKind::Key => {
                    constraints.push(format!(
                        "    CONSTRAINT {} PRIMARY KEY ({})",
                        self.pkey_constraint(),
                        field.name
                    ));
                    if self.key == KeyKind::Account {
                        constraints.push(format!(
                            "    CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} (id) ON DELETE CASCADE",
                            self.fkey_constraint(field.name),
                            field.name,
                            ACCOUNTS_TABLE
                        ));
                    }
                }
                FieldKind::Reference { table, .. } => constraints.push(format!(
                    "    CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} (id) ON DELETE CASCADE",
                    self.fkey_constraint(field.name),
                    field.name,
                    table
                )),
                FieldKind::Choice(variants) => {
                    let allowed: Vec<String> =
                        variants.iter().map(|v| format!("'{}'", v)).collect();
                    constraints.push(format!(
                        "    CONSTRAINT {} CHECK ({} IN ({}))",
                        self.check_constraint(field.name),
                        field.name,
                        allowed.join(", ")
                    ));
                }
                _ => {}
            }
        }

        for group in self.unique_together {
            constraints.push(format!(
                "    CONSTRAINT {} UNIQUE ({})",
                self.unique_constraint(group),
                group.join(", ")
            ));
        }

        lines.extend(constraints);
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.name,
            lines.join(",\n")
        )
    }

    /// Translates a violated Postgres constraint into the error a client would have got from
    /// validation. `row` is the rejected write.
    pub fn constraint_errors(&self, constraint: &str, row: &Row) -> FieldErrors {
        if constraint == self.pkey_constraint() {
            return self.duplicate_key_error();
        }

        for group in self.unique_together {
            if constraint == self.unique_constraint(group) {
                return self.unique_together_error(group);
            }
        }

        for field in self.fields {
            if constraint == self.fkey_constraint(field.name) {
                return missing_reference_error(field.name, row.get(field.name));
            }
            if constraint == self.check_constraint(field.name) {
                let shown = row
                    .get(field.name)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                return FieldErrors::single(
                    field.name,
                    format!("\"{}\" is not a valid choice.", shown),
                );
            }
        }

        FieldErrors::non_field(format!("Constraint {} was violated.", constraint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{connection, profile, skill};
    use crate::schema::NON_FIELD_ERRORS;
    use serde_json::json;

    #[test]
    fn test_profile_ddl() {
        let sql = profile::SCHEMA.create_table_sql();

        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS profiles ("));
        assert!(sql.contains("    id BIGINT NOT NULL"));
        assert!(sql.contains("    email VARCHAR(254) NOT NULL"));
        assert!(sql.contains("    full_name VARCHAR(255),"));
        assert!(sql.contains("    years_experience INTEGER,"));
        assert!(sql.contains("    open_to_work BOOLEAN NOT NULL DEFAULT false"));
        assert!(sql.contains("CONSTRAINT profiles_pkey PRIMARY KEY (id)"));
        assert!(sql.contains(
            "CONSTRAINT profiles_id_fkey FOREIGN KEY (id) REFERENCES accounts (id) ON DELETE CASCADE"
        ));
    }

    #[test]
    fn test_skill_ddl_has_reference_and_check() {
        let sql = skill::SCHEMA.create_table_sql();

        assert!(sql.contains("    id UUID NOT NULL"));
        assert!(sql.contains("    profile BIGINT NOT NULL"));
        assert!(sql.contains(
            "CONSTRAINT skills_profile_fkey FOREIGN KEY (profile) REFERENCES profiles (id) ON DELETE CASCADE"
        ));
        assert!(sql.contains(
            "CONSTRAINT skills_proficiency_check CHECK (proficiency IN ('beginner', 'intermediate', 'advanced', 'expert'))"
        ));
    }

    #[test]
    fn test_connection_ddl_unique_pair() {
        let sql = connection::SCHEMA.create_table_sql();
        assert!(sql.contains("CONSTRAINT connections_follower_following_key UNIQUE (follower, following)"));
        assert!(sql.contains("    status VARCHAR(20) NOT NULL DEFAULT 'connected'"));
    }

    #[test]
    fn test_constraint_errors() {
        let row = json!({ "follower": 3, "following": 4 })
            .as_object()
            .cloned()
            .unwrap();

        let unique = connection::SCHEMA.constraint_errors("connections_follower_following_key", &row);
        assert_eq!(
            unique.get(NON_FIELD_ERRORS).unwrap(),
            ["The fields follower, following must make a unique set."]
        );

        let missing = connection::SCHEMA.constraint_errors("connections_following_fkey", &row);
        assert_eq!(
            missing.get("following").unwrap(),
            ["Invalid pk \"4\" - object does not exist."]
        );

        let duplicate = profile::SCHEMA.constraint_errors("profiles_pkey", &row);
        assert_eq!(
            duplicate.get("id").unwrap(),
            ["profile with this id already exists."]
        );

        let other = connection::SCHEMA.constraint_errors("something_else", &row);
        assert!(other.contains(NON_FIELD_ERRORS));
    }
}
