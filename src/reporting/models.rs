use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const THREAD_DOC_TYPE: &str = "CHAT_THREAD";
pub const MESSAGE_DOC_TYPE: &str = "CHAT_MESSAGE";

/// One chat-thread document.
///
/// Historical documents are inconsistent about who owns a thread, so both
/// user fields are optional and [`ChatThreadRecord::user_key`] applies the
/// one sanctioned fallback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThreadRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ChatThreadRecord {
    pub fn new(
        id: impl Into<String>,
        title: Option<String>,
        user_id: Option<String>,
        user_name: Option<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            doc_type: THREAD_DOC_TYPE.to_string(),
            title,
            user_id,
            user_name,
            created_at,
        }
    }

    /// The identifier a thread contributes to unique-user counts: `userId`
    /// first, `userName` as fallback, otherwise none (the thread still
    /// counts as a conversation).
    pub fn user_key(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.user_name.as_deref().filter(|name| !name.is_empty()))
    }
}

/// One chat-message document inside a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub thread_id: String,
    pub role: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ChatMessageRecord {
    pub fn new(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        role: impl Into<String>,
        content: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            doc_type: MESSAGE_DOC_TYPE.to_string(),
            thread_id: thread_id.into(),
            role: role.into(),
            content: content.into(),
            created_at,
        }
    }
}

/// Aggregate for one UTC Monday–Sunday week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    #[serde(rename = "weekStartISO", with = "time::serde::rfc3339")]
    pub week_start: OffsetDateTime,
    #[serde(rename = "weekEndISO", with = "time::serde::rfc3339")]
    pub week_end: OffsetDateTime,
    #[serde(rename = "uniqueUsers")]
    pub unique_users: usize,
    pub conversations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn user_key_prefers_user_id() {
        let record = ChatThreadRecord::new(
            "t1",
            None,
            Some("user-1".into()),
            Some("Ada".into()),
            datetime!(2026-07-06 12:00 UTC),
        );
        assert_eq!(record.user_key(), Some("user-1"));
    }

    #[test]
    fn user_key_falls_back_to_user_name() {
        let record = ChatThreadRecord::new(
            "t1",
            None,
            Some(String::new()),
            Some("Ada".into()),
            datetime!(2026-07-06 12:00 UTC),
        );
        assert_eq!(record.user_key(), Some("Ada"));

        let anonymous = ChatThreadRecord::new("t2", None, None, None, datetime!(2026-07-06 12:00 UTC));
        assert_eq!(anonymous.user_key(), None);
    }

    #[test]
    fn thread_serializes_with_document_field_names() {
        let record = ChatThreadRecord::new(
            "t1",
            Some("Quarterly review".into()),
            Some("user-1".into()),
            None,
            datetime!(2026-07-06 12:00 UTC),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], THREAD_DOC_TYPE);
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["createdAt"], "2026-07-06T12:00:00Z");
    }

    #[test]
    fn summary_serializes_iso_keys() {
        let summary = WeeklySummary {
            week_start: datetime!(2026-06-29 00:00 UTC),
            week_end: datetime!(2026-07-05 23:59:59.999 UTC),
            unique_users: 3,
            conversations: 7,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("weekStartISO").is_some());
        assert!(json.get("weekEndISO").is_some());
        assert_eq!(json["uniqueUsers"], 3);
        assert_eq!(json["conversations"], 7);
    }
}
