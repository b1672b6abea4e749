use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use super::{Field, FieldKind, RecordKey, Row, TableSchema};

/// Key under which errors that belong to no single field are reported
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const EMAIL_MAX_LEN: usize = 254;
const URL_MAX_LEN: usize = 200;

/// Per-field error messages collected while checking a write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(NON_FIELD_ERRORS, message);
        errors
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Moves every message of `other` into this set
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Ok when nothing was collected
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Which kind of write a payload is checked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// POST: required fields must be present, defaults apply
    Create,
    /// PUT: required fields must be present, omitted optional fields keep their value
    Replace,
    /// PATCH: only the fields that are present are checked
    Patch,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
            .expect("email pattern is valid")
    })
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Host must be localhost, an IP literal or a dotted name ending in a TLD
        Regex::new(concat!(
            r"^(?i)(?:https?|ftps?)://",
            r"(?:[^\s:@/]+(?::[^\s:@/]*)?@)?",
            r"(?:localhost|\d{1,3}(?:\.\d{1,3}){3}|\[[0-9a-f:.]+\]",
            r"|(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}\.?)",
            r"(?::\d{1,5})?(?:[/?#]\S*)?$",
        ))
            .expect("url pattern is valid")
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl TableSchema {
    /// Checks a request body and returns the normalised columns it sets.
    ///
    /// Read-only columns and unknown keys are dropped. On create, omitted optional columns are
    /// filled with their default or null so the returned row is complete apart from the key and
    /// timestamps. Any error rejects the whole payload.
    pub fn validate(&self, input: &Value, mode: WriteMode) -> Result<Row, FieldErrors> {
        let object = match input {
            Value::Object(object) => object,
            other => {
                return Err(FieldErrors::non_field(format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type(other)
                )))
            }
        };

        let mut errors = FieldErrors::default();
        let mut row = Row::new();

        for field in self.fields {
            if field.read_only {
                if mode == WriteMode::Create {
                    if let Some(default) = field.default {
                        row.insert(field.name.to_string(), default.to_value());
                    }
                }
                continue;
            }

            match object.get(field.name) {
                None => match mode {
                    WriteMode::Patch => {}
                    _ if field.required => errors.add(field.name, "This field is required."),
                    WriteMode::Create => {
                        let value = field.default.map(|d| d.to_value()).unwrap_or(Value::Null);
                        row.insert(field.name.to_string(), value);
                    }
                    WriteMode::Replace => {
                        if let Some(default) = field.default {
                            row.insert(field.name.to_string(), default.to_value());
                        }
                    }
                },
                Some(Value::Null) if field.nullable => {
                    row.insert(field.name.to_string(), Value::Null);
                }
                Some(Value::Null) => errors.add(field.name, "This field may not be null."),
                Some(value) => match check_value(field, value) {
                    Ok(clean) => {
                        row.insert(field.name.to_string(), clean);
                    }
                    Err(message) => errors.add(field.name, message),
                },
            }
        }

        errors.into_result().map(|_| row)
    }

    pub fn duplicate_key_error(&self) -> FieldErrors {
        FieldErrors::single("id", format!("{} with this id already exists.", self.label))
    }

    pub fn unique_together_error(&self, group: &[&str]) -> FieldErrors {
        FieldErrors::non_field(format!(
            "The fields {} must make a unique set.",
            group.join(", ")
        ))
    }
}

/// Reference pointing at a row that does not exist
pub(crate) fn missing_reference_error(field: &str, value: Option<&Value>) -> FieldErrors {
    let shown = match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    FieldErrors::single(
        field,
        format!("Invalid pk \"{}\" - object does not exist.", shown),
    )
}

/// Floats like `3.0` count as integers; fractions and values past the i64 range do not
fn whole_number(f: f64) -> Option<i64> {
    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn check_value(field: &Field, value: &Value) -> Result<Value, String> {
    match field.kind {
        FieldKind::Text { max_len } => check_text(field, value, max_len).map(Value::String),
        FieldKind::Email => {
            let text = check_text(field, value, Some(EMAIL_MAX_LEN))?;
            if text.is_empty() || email_pattern().is_match(&text) {
                Ok(Value::String(text))
            } else {
                Err("Enter a valid email address.".to_string())
            }
        }
        FieldKind::Url => {
            let text = check_text(field, value, Some(URL_MAX_LEN))?;
            if text.is_empty() || url_pattern().is_match(&text) {
                Ok(Value::String(text))
            } else {
                Err("Enter a valid URL.".to_string())
            }
        }
        FieldKind::Integer => {
            let parsed = match value {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            let parsed = parsed.ok_or_else(|| "A valid integer is required.".to_string())?;
            if parsed > i64::from(i32::MAX) {
                Err(format!(
                    "Ensure this value is less than or equal to {}.",
                    i32::MAX
                ))
            } else if parsed < i64::from(i32::MIN) {
                Err(format!(
                    "Ensure this value is greater than or equal to {}.",
                    i32::MIN
                ))
            } else {
                Ok(Value::from(parsed))
            }
        }
        FieldKind::Boolean => {
            let parsed = match value {
                Value::Bool(b) => Some(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(1) => Some(true),
                    Some(0) => Some(false),
                    _ => None,
                },
                Value::String(s) => match s.to_ascii_lowercase().as_str() {
                    "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
                    "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
                    _ => None,
                },
                _ => None,
            };
            parsed
                .map(Value::Bool)
                .ok_or_else(|| "Must be a valid boolean.".to_string())
        }
        FieldKind::Choice(variants) => match value {
            Value::String(s) if variants.contains(&s.as_str()) => Ok(value.clone()),
            Value::String(s) => Err(format!("\"{}\" is not a valid choice.", s)),
            other => Err(format!("\"{}\" is not a valid choice.", other)),
        },
        FieldKind::Reference { key, .. } => match value {
            Value::String(_) | Value::Number(_) => RecordKey::from_value(key, value)
                .map(|k| k.to_value())
                .ok_or_else(|| {
                    let shown = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                    format!("Invalid pk \"{}\" - object does not exist.", shown)
                }),
            other => Err(format!(
                "Incorrect type. Expected pk value, received {}.",
                json_type(other)
            )),
        },
        FieldKind::Key | FieldKind::CreatedAt | FieldKind::UpdatedAt => Ok(value.clone()),
    }
}

fn check_text(field: &Field, value: &Value, max_len: Option<usize>) -> Result<String, String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err("Not a valid string.".to_string()),
    };

    if text.is_empty() && !field.nullable {
        return Err("This field may not be blank.".to_string());
    }

    if let Some(max) = max_len {
        if text.chars().count() > max {
            return Err(format!(
                "Ensure this field has no more than {} characters.",
                max
            ));
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDefault, KeyKind};
    use rstest::rstest;
    use serde_json::json;

    const TEST_FIELDS: &[Field] = &[
        Field::new("id", FieldKind::Key),
        Field::new("owner", FieldKind::Reference { table: "owners", key: KeyKind::Account }),
        Field::new("name", FieldKind::Text { max_len: Some(5) }),
        Field::new("email", FieldKind::Email),
        Field::new("site", FieldKind::Url).optional(),
        Field::new("level", FieldKind::Choice(&["low", "high"])),
        Field::new("count", FieldKind::Integer).optional(),
        Field::new("active", FieldKind::Boolean).with_default(FieldDefault::Bool(false)),
        Field::new("seen", FieldKind::Boolean)
            .read_only()
            .with_default(FieldDefault::Bool(false)),
        Field::new("created_at", FieldKind::CreatedAt),
    ];

    const TEST_TABLE: TableSchema = TableSchema {
        name: "things",
        label: "thing",
        key: KeyKind::Uuid,
        fields: TEST_FIELDS,
        unique_together: &[],
    };

    fn valid_payload() -> Value {
        json!({
            "owner": 1,
            "name": "abc",
            "email": "dev@example.com",
            "level": "low",
        })
    }

    #[test]
    fn test_create_fills_defaults_and_nulls() {
        let row = TEST_TABLE.validate(&valid_payload(), WriteMode::Create).unwrap();

        assert_eq!(row["active"], json!(false));
        assert_eq!(row["seen"], json!(false));
        assert_eq!(row["site"], Value::Null);
        assert_eq!(row["count"], Value::Null);
        assert!(!row.contains_key("id"));
        assert!(!row.contains_key("created_at"));
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = TEST_TABLE
            .validate(&json!({}), WriteMode::Create)
            .unwrap_err();

        for field in ["owner", "name", "email", "level"] {
            assert_eq!(errors.get(field).unwrap(), ["This field is required."]);
        }
        assert!(!errors.contains("site"));
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        let row = TEST_TABLE
            .validate(&json!({ "name": "xyz" }), WriteMode::Patch)
            .unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row["name"], json!("xyz"));
    }

    #[test]
    fn test_replace_keeps_omitted_optional_fields_out() {
        let row = TEST_TABLE.validate(&valid_payload(), WriteMode::Replace).unwrap();
        assert!(!row.contains_key("site"));
        assert!(!row.contains_key("seen"));
        assert_eq!(row["active"], json!(false));
    }

    #[test]
    fn test_read_only_input_is_ignored() {
        let mut payload = valid_payload();
        payload["seen"] = json!(true);
        payload["id"] = json!("not-a-key");
        let row = TEST_TABLE.validate(&payload, WriteMode::Create).unwrap();
        assert_eq!(row["seen"], json!(false));
        assert!(!row.contains_key("id"));
    }

    #[test]
    fn test_non_object_payload() {
        let errors = TEST_TABLE
            .validate(&json!([1, 2]), WriteMode::Create)
            .unwrap_err();
        assert_eq!(
            errors.get(NON_FIELD_ERRORS).unwrap(),
            ["Invalid data. Expected a dictionary, but got array."]
        );
    }

    #[rstest]
    #[case("name", json!("toolong"), "Ensure this field has no more than 5 characters.")]
    #[case("name", json!("   "), "This field may not be blank.")]
    #[case("name", json!(null), "This field may not be null.")]
    #[case("name", json!(["a"]), "Not a valid string.")]
    #[case("email", json!("not-an-email"), "Enter a valid email address.")]
    #[case("site", json!("example"), "Enter a valid URL.")]
    #[case("site", json!("http://foo"), "Enter a valid URL.")]
    #[case("site", json!("https://dev.-bad-.io"), "Enter a valid URL.")]
    #[case("level", json!("medium"), "\"medium\" is not a valid choice.")]
    #[case("count", json!("many"), "A valid integer is required.")]
    #[case("count", json!(2.5), "A valid integer is required.")]
    #[case("count", json!(1e20), "A valid integer is required.")]
    #[case("count", json!(u64::MAX), "A valid integer is required.")]
    #[case("count", json!(2147483648_i64), "Ensure this value is less than or equal to 2147483647.")]
    #[case("count", json!("-2147483649"), "Ensure this value is greater than or equal to -2147483648.")]
    #[case("active", json!("maybe"), "Must be a valid boolean.")]
    #[case("owner", json!("abc"), "Invalid pk \"abc\" - object does not exist.")]
    #[case("owner", json!({"id": 1}), "Incorrect type. Expected pk value, received object.")]
    fn test_field_errors(#[case] field: &str, #[case] value: Value, #[case] expected: &str) {
        let mut payload = valid_payload();
        payload[field] = value;
        let errors = TEST_TABLE
            .validate(&payload, WriteMode::Create)
            .unwrap_err();
        assert_eq!(errors.get(field).unwrap(), [expected]);
    }

    #[test]
    fn test_values_are_normalised() {
        let mut payload = valid_payload();
        payload["owner"] = json!("12");
        payload["name"] = json!("  ab ");
        payload["count"] = json!("3");
        payload["active"] = json!("true");
        payload["site"] = json!("https://example.com/me");
        let row = TEST_TABLE.validate(&payload, WriteMode::Create).unwrap();

        assert_eq!(row["owner"], json!(12));
        assert_eq!(row["name"], json!("ab"));
        assert_eq!(row["count"], json!(3));
        assert_eq!(row["active"], json!(true));
        assert_eq!(row["site"], json!("https://example.com/me"));
    }

    #[rstest]
    #[case("https://example.com/me")]
    #[case("http://localhost:8000/api")]
    #[case("http://127.0.0.1/health")]
    #[case("https://sub.domain.dev?tab=repos")]
    fn test_urls_accepted(#[case] url: &str) {
        let mut payload = valid_payload();
        payload["site"] = json!(url);
        let row = TEST_TABLE.validate(&payload, WriteMode::Create).unwrap();
        assert_eq!(row["site"], json!(url));
    }

    #[test]
    fn test_whole_float_is_integer() {
        let mut payload = valid_payload();
        payload["count"] = json!(3.0);
        let row = TEST_TABLE.validate(&payload, WriteMode::Create).unwrap();
        assert_eq!(row["count"], json!(3));
    }

    #[test]
    fn test_optional_blank_allowed() {
        let mut payload = valid_payload();
        payload["site"] = json!("");
        let row = TEST_TABLE.validate(&payload, WriteMode::Create).unwrap();
        assert_eq!(row["site"], json!(""));
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::default();
        errors.add("email", "This field is required.");
        errors.add("name", "This field may not be blank.");
        assert_eq!(
            errors.to_string(),
            "email: This field is required.; name: This field may not be blank."
        );
    }
}
