//! The parts of a GitHub webhook payload the gatekeeper looks at.
//!
//! Every field is optional so that payloads of any event type decode, not just
//! `push`. Whatever isn't modeled here ends up in `extra`. An explicit `null`
//! decodes the same as a missing field.

use serde::{Deserialize, Deserializer};

fn nullable<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Commit {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub message: String,
    #[serde(default)]
    pub author: Option<User>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushEvent {
    #[serde(default, deserialize_with = "nullable")]
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub head_commit: Option<Commit>,
    #[serde(default)]
    pub pusher: Option<User>,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub created: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub deleted: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PushEvent {
    /// Head commit if the payload has one, the first listed commit otherwise.
    pub fn relevant_commit(&self) -> Option<&Commit> {
        self.head_commit.as_ref().or_else(|| self.commits.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_push_payload() {
        let event: PushEvent = serde_json::from_str(
            r#"{
                "ref": "refs/tags/v1.0",
                "base_ref": "refs/heads/main",
                "created": true,
                "commits": [{"id": "a1", "message": "first"}],
                "head_commit": {
                    "id": "b2",
                    "message": "second",
                    "author": {"name": "octocat", "email": null}
                },
                "pusher": {"name": "octocat", "email": "octocat@github.com"},
                "repository": {"full_name": "octo/repo"}
            }"#,
        )
        .unwrap();

        assert_eq!(event.reference.as_deref(), Some("refs/tags/v1.0"));
        assert_eq!(event.base_ref.as_deref(), Some("refs/heads/main"));
        assert!(event.created);
        assert!(!event.deleted);
        assert_eq!(event.commits.len(), 1);
        assert_eq!(event.relevant_commit().unwrap().id, "b2");
        let author = event.head_commit.as_ref().unwrap().author.as_ref().unwrap();
        assert_eq!(author.email, None);
        assert_eq!(
            event.pusher.unwrap().email.as_deref(),
            Some("octocat@github.com")
        );
        assert!(event.extra.contains_key("repository"));
    }

    #[test]
    fn decodes_payload_without_push_fields() {
        let event: PushEvent =
            serde_json::from_str(r#"{"action": "opened", "number": 3}"#).unwrap();

        assert!(event.reference.is_none());
        assert!(event.pusher.is_none());
        assert!(event.relevant_commit().is_none());
    }

    #[test]
    fn null_fields_decode_as_missing() {
        let event: PushEvent = serde_json::from_str(
            r#"{
                "ref": "refs/heads/main",
                "commits": null,
                "created": null,
                "deleted": null,
                "head_commit": {"id": null, "message": null}
            }"#,
        )
        .unwrap();

        assert!(event.commits.is_empty());
        assert!(!event.created);
        assert!(!event.deleted);
        assert_eq!(event.relevant_commit().unwrap().message, "");
    }

    #[test]
    fn falls_back_to_first_commit() {
        let event: PushEvent =
            serde_json::from_str(r#"{"commits": [{"message": "a"}, {"message": "b"}]}"#)
                .unwrap();

        assert_eq!(event.relevant_commit().unwrap().message, "a");
    }
}
