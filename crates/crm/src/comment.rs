use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, require_text};

/// Feedback left through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub residence_state: String,
    #[serde(default)]
    pub residence_city: String,
    pub comment: String,
}

impl Entity for Comment {
    const KIND: &'static str = "comment";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "name", "email"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("email", &self.email)?;
        require_text("comment", &self.comment)?;
        if !self.email.contains('@') {
            return Err(DomainError::validation(format!("'{}' is not a valid email", self.email)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_case_insensitive_on_email() {
        let c: Comment = serde_json::from_value(serde_json::json!({
            "name": "Luis",
            "email": "Luis.Perez@Example.com",
            "comment": "Great service"
        }))
        .unwrap();
        assert!(c.validate().is_ok());
        assert!(c.matches("email", "perez@example"));
        assert!(!c.matches("name", "ana"));
    }

    #[test]
    fn comment_text_is_required() {
        let c: Comment = serde_json::from_value(serde_json::json!({
            "name": "Luis", "email": "l@example.com", "comment": "  "
        }))
        .unwrap();
        assert_eq!(c.validate(), Err(DomainError::MissingField("comment")));
    }
}
