// Wire types for the lighting server's HTTP API.
//
// These mirror the server's JSON exactly. Anything beyond the fields the
// core needs is kept in flattened maps so nothing is silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A server-declared group: a name prefix and its member thing names.
///
/// The server emits the member list as `lights` even though switches are
/// listed there too; `members` is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    #[serde(default, alias = "lights")]
    pub members: Vec<String>,
}

/// State record of a single light or switch, as returned by
/// `get_lights` / `get_switches` and pushed over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThingRecord {
    pub thing_name: String,
    /// Every other field (`state`, `brightness`, `color_temp`, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Raw metadata record from `z2m/meta/{name}`.
///
/// A superset of what the core keeps; `actions` in particular carries every
/// exposed capability of the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub thing_type: Option<String>,
    #[serde(default)]
    pub thing_id: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub actions: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response body of `get_ws_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEndpoint {
    pub url: String,
}

/// The metadata hash is an opaque token; the server may encode it as a
/// string or as a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HashToken {
    Text(String),
    Number(serde_json::Number),
}

impl HashToken {
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_accepts_lights_alias() {
        let group: GroupRecord =
            serde_json::from_value(json!({ "name": "Kitchen", "lights": ["KitchenCeiling"] }))
                .unwrap();
        assert_eq!(group.members, vec!["KitchenCeiling".to_string()]);
    }

    #[test]
    fn thing_record_keeps_extra_fields() {
        let thing: ThingRecord = serde_json::from_value(json!({
            "thing_name": "TVRoomLamp",
            "state": true,
            "brightness": 120,
            "linkquality": 87
        }))
        .unwrap();
        assert_eq!(thing.thing_name, "TVRoomLamp");
        assert_eq!(thing.fields["brightness"], 120);
        assert_eq!(thing.fields["linkquality"], 87);
        assert!(!thing.fields.contains_key("thing_name"));
    }

    #[test]
    fn metadata_tolerates_missing_and_null_fields() {
        let meta: MetadataRecord = serde_json::from_value(json!({
            "name": "TVRoomLamp",
            "model": null,
            "vendor": "IKEA"
        }))
        .unwrap();
        assert_eq!(meta.name.as_deref(), Some("TVRoomLamp"));
        assert!(meta.model.is_none());
        assert!(meta.actions.is_none());
        assert_eq!(meta.extra["vendor"], "IKEA");
    }

    #[test]
    fn hash_token_from_number_or_string() {
        let a: HashToken = serde_json::from_value(json!("abc123")).unwrap();
        let b: HashToken = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(a.into_string(), "abc123");
        assert_eq!(b.into_string(), "42");
    }
}
