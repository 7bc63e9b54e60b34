use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: String,
    pub group_id: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Comment joined with its author's username, as shown under a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Field name plus message, collected while validating a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    /// Message for `field`, or an empty string; convenient in templates.
    pub fn message(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }
}

pub const REQUIRED: &str = "This field is required.";

/// A post that has passed validation and is ready to insert.
///
/// Author, text and publication time are fixed together at construction; group
/// and image are optional extras.
#[derive(Debug, Clone)]
pub struct NewPost {
    author_id: String,
    text: String,
    pub_date: DateTime<Utc>,
    group_id: Option<String>,
    image: Option<String>,
}

impl NewPost {
    pub fn new(
        author_id: impl Into<String>,
        text: &str,
        pub_date: DateTime<Utc>,
    ) -> Result<Self, FieldErrors> {
        let text = text.trim();
        if text.is_empty() {
            let mut errors = FieldErrors::default();
            errors.add("text", REQUIRED);
            return Err(errors);
        }
        Ok(Self {
            author_id: author_id.into(),
            text: text.to_string(),
            pub_date: store_precision(pub_date),
            group_id: None,
            image: None,
        })
    }

    pub fn group(mut self, group_id: Option<String>) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pub_date(&self) -> DateTime<Utc> {
        self.pub_date
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

/// Replacement values for an existing post. Publication time is not editable.
#[derive(Debug, Clone)]
pub struct PostEdit {
    pub text: String,
    pub group_id: Option<String>,
    pub image: Option<String>,
}

impl PostEdit {
    pub fn new(text: &str, group_id: Option<String>, image: Option<String>) -> Result<Self, FieldErrors> {
        let text = text.trim();
        if text.is_empty() {
            let mut errors = FieldErrors::default();
            errors.add("text", REQUIRED);
            return Err(errors);
        }
        Ok(Self {
            text: text.to_string(),
            group_id,
            image,
        })
    }
}

/// Drop precision the store cannot keep, so stored and in-memory values agree.
pub fn store_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so stored timestamps order correctly as text.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_post_trims_text() {
        let post = NewPost::new("u1", "  hello  ", Utc::now()).unwrap();
        assert_eq!(post.text(), "hello");
        assert!(post.group_id().is_none());
    }

    #[test]
    fn new_post_rejects_blank_text() {
        let errors = NewPost::new("u1", "   ", Utc::now()).unwrap_err();
        assert_eq!(errors.get("text"), Some(REQUIRED));
    }

    #[test]
    fn new_post_builder_sets_optional_fields() {
        let post = NewPost::new("u1", "hi", Utc::now())
            .unwrap()
            .group(Some("g1".into()))
            .image(Some("posts/a.gif".into()));
        assert_eq!(post.group_id(), Some("g1"));
        assert_eq!(post.image_path(), Some("posts/a.gif"));
    }

    #[test]
    fn timestamps_round_trip_and_sort_as_text() {
        let early = Utc.with_ymd_and_hms(2021, 7, 4, 16, 15, 0).unwrap();
        let late = early + chrono::Duration::milliseconds(5);
        let (a, b) = (format_timestamp(&early), format_timestamp(&late));
        assert!(a < b);
        assert_eq!(parse_timestamp(&a).unwrap(), early);
    }

    #[test]
    fn field_errors_message_defaults_to_empty() {
        let mut errors = FieldErrors::default();
        assert_eq!(errors.message("text"), "");
        errors.add("group", "Select a valid choice.");
        assert_eq!(errors.message("group"), "Select a valid choice.");
        assert!(!errors.is_empty());
    }
}
