//! The persisted entity contract shared by every reference and business record.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{DomainError, DomainResult, EntityId};

/// A natural key that must be unique among entities of the same kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub name: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self { name, value: value.into() }
    }
}

/// A record stored by id in a repository.
///
/// Field names used by `field` and `SEARCH_FIELDS` are the serialized JSON
/// names, so in-memory and JSONB-backed stores agree on search semantics.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Stable kind label (storage partition and log field).
    const KIND: &'static str;

    /// Fields that support partial, case-insensitive search.
    const SEARCH_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> EntityId;

    fn set_id(&mut self, id: EntityId);

    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    /// Check field-level invariants before the record is written.
    fn validate(&self) -> DomainResult<()> {
        Ok(())
    }

    /// Text rendering of a serialized field (`None` when absent or null).
    fn field(&self, name: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        match value.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Partial, case-insensitive match of `needle` against `field`.
    fn matches(&self, field: &str, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.field(field)
            .map(|v| v.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }
}

/// Reject blank required text fields.
pub fn require_text(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Widget {
        id: EntityId,
        name: String,
        stock: i64,
        note: Option<String>,
    }

    impl Entity for Widget {
        const KIND: &'static str = "widget";
        const SEARCH_FIELDS: &'static [&'static str] = &["id", "name"];

        fn id(&self) -> EntityId {
            self.id
        }

        fn set_id(&mut self, id: EntityId) {
            self.id = id;
        }
    }

    fn widget() -> Widget {
        Widget { id: EntityId::new(7).unwrap(), name: "Blue Widget".into(), stock: 12, note: None }
    }

    #[test]
    fn field_renders_strings_numbers_and_nulls() {
        let w = widget();
        assert_eq!(w.field("name").as_deref(), Some("Blue Widget"));
        assert_eq!(w.field("stock").as_deref(), Some("12"));
        assert_eq!(w.field("id").as_deref(), Some("7"));
        assert_eq!(w.field("note"), None);
        assert_eq!(w.field("missing"), None);
    }

    #[test]
    fn matches_is_partial_and_case_insensitive() {
        let w = widget();
        assert!(w.matches("name", "blue"));
        assert!(w.matches("name", "WIDG"));
        assert!(!w.matches("name", "red"));
        assert!(!w.matches("note", ""));
    }

    #[test]
    fn require_text_rejects_blank() {
        assert_eq!(require_text("name", "  "), Err(DomainError::MissingField("name")));
        assert!(require_text("name", "x").is_ok());
    }
}
