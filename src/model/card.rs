use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A label (tag) defined on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Counts the service precomputes for each card so clients can avoid
/// fetching the full attachment/comment collections up front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Badges {
    pub attachments: u32,
    pub comments: u32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single card as returned by the remote board service.
///
/// The client never owns a card; this is a transient local copy that must be
/// refreshed after a mutation. Fields the service sends but this client does
/// not model are kept verbatim in `extra` so JSON output stays complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub id_labels: Vec<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub id_list: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub date_last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub short_url: Option<String>,
    #[serde(default)]
    pub badges: Badges,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Card {
    /// Creation time, derived from the object-id prefix (first 8 hex digits
    /// are the epoch seconds). The service does not send this as a field.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let prefix = self.id.get(..8)?;
        let secs = u32::from_str_radix(prefix, 16).ok()?;
        DateTime::from_timestamp(i64::from(secs), 0)
    }

    pub fn label_names(&self) -> Vec<&str> {
        self.labels.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn has_label_id(&self, label_id: &str) -> bool {
        self.id_labels.iter().any(|id| id == label_id)
    }
}

/// An attachment on a card. `url` is absent for file uploads that have
/// expired or were removed on the service side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Attachment {
    /// Display name, falling back to the URL for unnamed link attachments.
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.url.as_deref())
            .unwrap_or(&self.id)
    }
}

/// A comment action on a card.
#[derive(Debug, Clone, Deserialize)]
pub struct CardComment {
    pub date: DateTime<Utc>,
    #[serde(rename = "memberCreator", default)]
    pub member: Option<CommentMember>,
    pub data: CommentData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentMember {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentData {
    #[serde(default)]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_card_json() -> &'static str {
        r#"{
            "id": "5e6a1f00aabbccddeeff0011",
            "name": "Write release notes",
            "desc": "Cover the breaking changes",
            "due": "2020-03-20T12:00:00.000Z",
            "idLabels": ["lab1"],
            "labels": [{"id": "lab1", "name": "urgent", "color": "red"}],
            "idList": "list1",
            "closed": false,
            "dateLastActivity": "2020-03-12T09:30:00.000Z",
            "shortUrl": "https://boards.example.com/c/abc123",
            "badges": {"attachments": 2, "comments": 1, "votes": 0},
            "subscribed": true,
            "pos": 16384
        }"#
    }

    #[test]
    fn test_parse_card() {
        let card: Card = serde_json::from_str(sample_card_json()).unwrap();
        assert_eq!(card.name, "Write release notes");
        assert_eq!(card.id_list, "list1");
        assert_eq!(card.labels[0].name, "urgent");
        assert_eq!(card.badges.attachments, 2);
        assert!(card.due.is_some());
    }

    #[test]
    fn test_extra_fields_preserved() {
        let card: Card = serde_json::from_str(sample_card_json()).unwrap();
        // Unmodeled fields land in the side-map and survive re-serialization
        assert_eq!(card.extra.get("pos").and_then(|v| v.as_i64()), Some(16384));
        let out = serde_json::to_value(&card).unwrap();
        assert_eq!(out.get("subscribed").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_created_at_from_id() {
        let card: Card = serde_json::from_str(sample_card_json()).unwrap();
        // 0x5e6a1f00 == 1584012032
        let created = card.created_at().unwrap();
        assert_eq!(created.timestamp(), 0x5e6a1f00);
    }

    #[test]
    fn test_created_at_bad_id() {
        let mut card: Card = serde_json::from_str(sample_card_json()).unwrap();
        card.id = "zzz".to_string();
        assert!(card.created_at().is_none());
    }

    #[test]
    fn test_missing_optionals_default() {
        let card: Card =
            serde_json::from_str(r#"{"id": "abc", "name": "bare", "idList": "l"}"#).unwrap();
        assert_eq!(card.desc, "");
        assert!(card.due.is_none());
        assert!(card.labels.is_empty());
        assert_eq!(card.badges.attachments, 0);
    }

    #[test]
    fn test_attachment_title_fallback() {
        let a = Attachment {
            id: "a1".to_string(),
            name: Some(String::new()),
            url: Some("https://example.com/x".to_string()),
        };
        assert_eq!(a.title(), "https://example.com/x");
    }
}
