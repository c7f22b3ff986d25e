//! Messages as the tracking API expects them.
use serde::Serialize;
use serde_json::Value;

use super::Properties;
use crate::{identity::Identity, serde::now_iso8601};

/// Fields every message carries.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Common {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub anonymous_id: String,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub context: Context,
}

impl Common {
    fn new(anonymous_id: &str, user_id: Option<String>, timestamp: Option<String>) -> Self {
        Self {
            user_id,
            anonymous_id: anonymous_id.to_string(),
            message_id: random_id(),
            timestamp,
            context: Context::default(),
        }
    }

    /// Picks `user_id` and `timestamp` out of a normalized payload.
    fn from_payload(anonymous_id: &str, payload: &Properties) -> Self {
        let field = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);
        Self::new(anonymous_id, field("user_id"), field("timestamp"))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct Context {
    pub library: Library,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            library: Library {
                name: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct Library {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct Identify {
    #[serde(flatten)]
    pub common: Common,
    pub traits: Properties,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct Track {
    #[serde(flatten)]
    pub common: Common,
    pub event: String,
    pub properties: Properties,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct Page {
    #[serde(flatten)]
    pub common: Common,
    pub name: String,
    pub properties: Properties,
}

/// One call to the tracking API.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum Message {
    Identify(Identify),
    Track(Track),
    Page(Page),
}

impl Message {
    pub(crate) fn identify(anonymous_id: &str, user_id: &Identity, traits: &Properties) -> Self {
        Message::Identify(Identify {
            common: Common::new(anonymous_id, Some(user_id.to_string()), Some(now_iso8601())),
            traits: traits.clone(),
        })
    }

    pub(crate) fn track(anonymous_id: &str, event: &str, properties: &Properties) -> Self {
        Message::Track(Track {
            common: Common::from_payload(anonymous_id, properties),
            event: event.to_string(),
            properties: properties.clone(),
        })
    }

    pub(crate) fn page(anonymous_id: &str, name: &str, properties: &Properties) -> Self {
        Message::Page(Page {
            common: Common::from_payload(anonymous_id, properties),
            name: name.to_string(),
            properties: properties.clone(),
        })
    }

    /// Path of the single-message endpoint, relative to the base URL.
    pub(crate) fn path(&self) -> &'static str {
        match self {
            Message::Identify(_) => "v1/identify",
            Message::Track(_) => "v1/track",
            Message::Page(_) => "v1/page",
        }
    }
}

/// Body of the batch endpoint.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Batch<'a> {
    pub batch: &'a [Message],
    pub sent_at: String,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(batch: &'a [Message]) -> Self {
        Self {
            batch,
            sent_at: now_iso8601(),
        }
    }
}

/// 32 random hex digits.
pub(crate) fn random_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_track_lifts_user_id_and_timestamp() {
        let properties = props(json!({
            "program_id": "cs_data",
            "user_id": "user_abc",
            "timestamp": "2024-12-20T18:00:00.000Z",
        }));
        let message = Message::track("anon", "Program Viewed", &properties);
        assert_eq!(message.path(), "v1/track");

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], json!("track"));
        assert_eq!(value["userId"], json!("user_abc"));
        assert_eq!(value["anonymousId"], json!("anon"));
        assert_eq!(value["timestamp"], json!("2024-12-20T18:00:00.000Z"));
        assert_eq!(value["event"], json!("Program Viewed"));
        assert_eq!(value["properties"]["program_id"], json!("cs_data"));
        assert_eq!(value["context"]["library"]["name"], json!("campus-analytics"));
        assert_eq!(value["messageId"].as_str().map(str::len), Some(32));
    }

    #[test]
    fn test_anonymous_track_has_no_user_id() {
        let message = Message::track("anon", "Event RSVPed", &Properties::new());
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("userId").is_none());
        assert!(value.get("timestamp").is_none());
    }

    #[test]
    fn test_identify_and_page_shape() {
        let traits = props(json!({"email": "a@b.com"}));
        let value =
            serde_json::to_value(Message::identify("anon", &"user_abc".into(), &traits)).unwrap();
        assert_eq!(value["type"], json!("identify"));
        assert_eq!(value["userId"], json!("user_abc"));
        assert_eq!(value["traits"], json!({"email": "a@b.com"}));

        let value = serde_json::to_value(Message::page("anon", "Homepage", &Properties::new()))
            .unwrap();
        assert_eq!(value["type"], json!("page"));
        assert_eq!(value["name"], json!("Homepage"));
    }

    #[test]
    fn test_message_ids_differ() {
        assert_ne!(random_id(), random_id());
    }
}
