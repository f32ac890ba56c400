use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A user object from `GET /v1/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionUser {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub person: Option<Person>,
}

/// Person-specific payload of a user object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub email: Option<String>,
}

impl NotionUser {
    /// True for human users, false for bots and integrations.
    pub fn is_person(&self) -> bool {
        self.kind.as_deref() == Some("person")
    }

    pub fn email(&self) -> Option<&str> {
        self.person.as_ref().and_then(|p| p.email.as_deref())
    }
}

/// Reference to a user by id only, as carried in `created_by`,
/// `last_edited_by` and mentions.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: String,
}

/// A page object, from `GET /v1/pages/{id}` or a database query row.
///
/// Every field is optional because database queries may return partial
/// rows; [`PageObject::is_full`] is the completeness predicate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageObject {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_edited_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub last_edited_by: Option<UserRef>,
}

impl PageObject {
    /// Whether this is a full page object rather than a partial row.
    pub fn is_full(&self) -> bool {
        self.object.as_deref() == Some("page")
            && self.url.is_some()
            && self.created_time.is_some()
            && self.last_edited_time.is_some()
    }
}

/// A child block from `GET /v1/blocks/{id}/children`, tagged by `type`.
/// Block types the hound does not care about collapse into `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "callout")]
    Callout { id: String, callout: Callout },
    #[serde(rename = "child_page")]
    ChildPage { id: String },
    #[serde(rename = "child_database")]
    ChildDatabase {
        id: String,
        child_database: ChildDatabase,
    },
    #[serde(other)]
    Other,
}

/// Callout block payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Callout {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

/// Child database block payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChildDatabase {
    #[serde(default)]
    pub title: String,
}

/// A rich text fragment, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum RichText {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        plain_text: String,
    },
    #[serde(rename = "mention")]
    Mention {
        #[serde(default)]
        mention: Mention,
        #[serde(default)]
        plain_text: String,
    },
    #[serde(other)]
    Other,
}

/// Mention payload. Only user mentions carry a `user` field; date and
/// page mentions leave it empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mention {
    #[serde(default)]
    pub user: Option<UserRef>,
}

/// Envelope for paginated list endpoints. Results stay raw so callers can
/// decode element-wise and drop malformed entries.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn person_user_decodes_with_email() {
        let user: NotionUser = serde_json::from_value(json!({
            "object": "user",
            "id": "17ceeff0-e5a5-11ed-aa7f-2cf05d7be51f",
            "type": "person",
            "name": "Malenia",
            "person": { "email": "malenia@haligate.tree" }
        }))
        .unwrap();
        assert!(user.is_person());
        assert_eq!(user.email(), Some("malenia@haligate.tree"));
    }

    #[test]
    fn bot_user_is_not_a_person() {
        let user: NotionUser = serde_json::from_value(json!({
            "id": "bot-1",
            "type": "bot",
            "name": "Integration",
            "bot": {}
        }))
        .unwrap();
        assert!(!user.is_person());
        assert_eq!(user.email(), None);
    }

    #[test]
    fn callout_block_decodes_mentions_and_text() {
        let block: Block = serde_json::from_value(json!({
            "id": "b1",
            "type": "callout",
            "callout": {
                "rich_text": [
                    {
                        "type": "mention",
                        "mention": { "type": "user", "user": { "id": "u1" } },
                        "plain_text": "@Malenia"
                    },
                    { "type": "text", "plain_text": "nhound{3 weeks}" }
                ]
            }
        }))
        .unwrap();
        let Block::Callout { callout, .. } = block else {
            panic!("expected a callout");
        };
        assert_eq!(callout.rich_text.len(), 2);
        let RichText::Mention { mention, .. } = &callout.rich_text[0] else {
            panic!("expected a mention");
        };
        assert_eq!(mention.user.as_ref().map(|u| u.id.as_str()), Some("u1"));
    }

    #[test]
    fn date_mentions_carry_no_user() {
        let fragment: RichText = serde_json::from_value(json!({
            "type": "mention",
            "mention": { "type": "date", "date": { "start": "2077-05-21" } },
            "plain_text": "May 21"
        }))
        .unwrap();
        let RichText::Mention { mention, .. } = fragment else {
            panic!("expected a mention");
        };
        assert!(mention.user.is_none());
    }

    #[test]
    fn unknown_block_types_collapse_to_other() {
        let block: Block = serde_json::from_value(json!({
            "id": "b2",
            "type": "paragraph",
            "paragraph": { "rich_text": [] }
        }))
        .unwrap();
        assert!(matches!(block, Block::Other));
    }

    #[test]
    fn child_database_block_carries_its_title() {
        let block: Block = serde_json::from_value(json!({
            "id": "db1",
            "type": "child_database",
            "child_database": { "title": "Weekly Meeting Notes" }
        }))
        .unwrap();
        let Block::ChildDatabase { child_database, .. } = block else {
            panic!("expected a child database");
        };
        assert_eq!(child_database.title, "Weekly Meeting Notes");
    }

    #[test]
    fn partial_rows_fail_the_completeness_predicate() {
        let partial: PageObject = serde_json::from_value(json!({
            "object": "page",
            "id": "row-1"
        }))
        .unwrap();
        assert!(!partial.is_full());

        let full: PageObject = serde_json::from_value(json!({
            "object": "page",
            "id": "row-2",
            "url": "https://www.notion.so/Row-2-abc123",
            "created_time": "2077-01-01T00:00:00.000Z",
            "last_edited_time": "2077-02-01T00:00:00.000Z",
            "created_by": { "object": "user", "id": "u1" },
            "last_edited_by": { "object": "user", "id": "u2" }
        }))
        .unwrap();
        assert!(full.is_full());
    }
}
