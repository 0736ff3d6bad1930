//! Comment form data and validation

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Email shape accepted by the form; the browser script uses the same pattern
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

lazy_static! {
    static ref EMAIL: Regex = Regex::new(EMAIL_PATTERN).expect("valid regex");
}

/// Form fields, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    #[serde(rename = "_id")]
    PostId,
    Name,
    Email,
    Comment,
}

/// Per-field validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn insert(&mut self, field: Field, message: &'static str) {
        self.0.insert(field, message);
    }
}

/// Raw form input as posted by the browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentForm {
    /// Hidden field carrying the post id
    #[serde(rename = "_id", default)]
    pub post_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub comment: String,
}

impl CommentForm {
    pub fn new(post_id: &str, name: &str, email: &str, comment: &str) -> Self {
        Self {
            post_id: post_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            comment: comment.to_string(),
        }
    }

    /// Check required fields; whitespace-only input counts as missing
    pub fn validate(&self) -> Result<NewComment, FieldErrors> {
        let mut errors = FieldErrors::default();

        let post_id = self.post_id.trim();
        let name = self.name.trim();
        let email = self.email.trim();
        let comment = self.comment.trim();

        if post_id.is_empty() {
            errors.insert(Field::PostId, "Post id is missing");
        }
        if name.is_empty() {
            errors.insert(Field::Name, "Name Field is required");
        }
        if email.is_empty() {
            errors.insert(Field::Email, "Email Field is required");
        } else if !EMAIL.is_match(email) {
            errors.insert(Field::Email, "Email is not valid");
        }
        if comment.is_empty() {
            errors.insert(Field::Comment, "Comment Field is required");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewComment {
            post_id: post_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            comment: comment.to_string(),
        })
    }
}

/// A validated comment, ready to be stored for moderation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: String,
    pub name: String,
    pub email: String,
    pub comment: String,
}

impl NewComment {
    /// The CMS document to create; always unapproved
    pub fn to_document(&self) -> Value {
        json!({
            "_type": "comment",
            "post": {
                "_type": "reference",
                "_ref": self.post_id,
            },
            "name": self.name,
            "email": self.email,
            "comment": self.comment,
            "approved": false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_form() {
        let form = CommentForm::new("post-1", " Jane ", "jane@x.com", "Great post!");
        let comment = form.validate().unwrap();
        assert_eq!(comment.name, "Jane");
        assert_eq!(comment.email, "jane@x.com");
        assert_eq!(comment.comment, "Great post!");
    }

    #[test]
    fn test_missing_name() {
        let form = CommentForm::new("post-1", "", "jane@x.com", "Great post!");
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(Field::Name), Some("Name Field is required"));
    }

    #[test]
    fn test_all_missing() {
        let errors = CommentForm::new("post-1", "  ", "", "\n").validate().unwrap_err();
        assert_eq!(errors.get(Field::Name), Some("Name Field is required"));
        assert_eq!(errors.get(Field::Email), Some("Email Field is required"));
        assert_eq!(errors.get(Field::Comment), Some("Comment Field is required"));
        assert_eq!(errors.get(Field::PostId), None);
    }

    #[test]
    fn test_invalid_email() {
        let errors = CommentForm::new("post-1", "Jane", "jane.x.com", "Hi")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get(Field::Email), Some("Email is not valid"));
    }

    #[test]
    fn test_missing_post_id() {
        let errors = CommentForm::new("", "Jane", "jane@x.com", "Hi")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get(Field::PostId), Some("Post id is missing"));
    }

    #[test]
    fn test_form_json_shape() {
        let form: CommentForm = serde_json::from_str(
            r#"{"_id":"post-1","name":"Jane","email":"jane@x.com","comment":"Great post!"}"#,
        )
        .unwrap();
        assert_eq!(form.post_id, "post-1");

        let errors = CommentForm::new("post-1", "", "", "x").validate().unwrap_err();
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({ "name": "Name Field is required", "email": "Email Field is required" })
        );
    }

    #[test]
    fn test_document_is_unapproved_reference() {
        let comment = CommentForm::new("post-1", "Jane", "jane@x.com", "Great post!")
            .validate()
            .unwrap();
        assert_eq!(
            comment.to_document(),
            json!({
                "_type": "comment",
                "post": { "_type": "reference", "_ref": "post-1" },
                "name": "Jane",
                "email": "jane@x.com",
                "comment": "Great post!",
                "approved": false
            })
        );
    }
}
