// ── Things and buttons ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A partial state record: only the fields present are applied.
pub type StatePatch = Map<String, Value>;

/// Wire field carrying a thing's identity. Never part of its state map.
const NAME_FIELD: &str = "thing_name";

/// Which server collection a thing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
    Lights,
    Switches,
}

impl Collection {
    /// The kind of every thing in this collection.
    pub fn kind(self) -> ThingKind {
        match self {
            Self::Lights => ThingKind::Light,
            Self::Switches => ThingKind::Switch,
        }
    }
}

/// What a group member is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThingKind {
    Light,
    Switch,
    Button,
}

/// A light or switch whose canonical state lives on the server.
///
/// `state` is an open map: the server may report fields the store doesn't
/// know about, and they survive every merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    #[serde(rename = "thing_name")]
    pub name: String,
    pub kind: ThingKind,
    #[serde(flatten)]
    pub state: Map<String, Value>,
}

impl Thing {
    pub fn new(name: impl Into<String>, kind: ThingKind) -> Self {
        Self {
            name: name.into(),
            kind,
            state: Map::new(),
        }
    }

    /// Shallow-overwrite every field in `patch` onto this thing's state.
    ///
    /// Fields absent from the patch are untouched. The identity field is
    /// ignored. Returns whether anything actually changed, so applying the
    /// same patch twice reports `false` the second time.
    pub fn merge_patch(&mut self, patch: &StatePatch) -> bool {
        let mut changed = false;
        for (key, value) in patch {
            if key == NAME_FIELD {
                continue;
            }
            if self.state.get(key) != Some(value) {
                self.state.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// On/off, if the server reported it.
    pub fn is_on(&self) -> Option<bool> {
        match self.state.get("state")? {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("on") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("off") => Some(false),
            _ => None,
        }
    }

    /// Brightness in `0..=254`.
    pub fn brightness(&self) -> Option<u8> {
        self.state
            .get("brightness")?
            .as_u64()
            .and_then(|b| u8::try_from(b).ok())
    }

    pub fn color_temp(&self) -> Option<u64> {
        self.state.get("color_temp")?.as_u64()
    }

    pub fn color_rgb(&self) -> Option<&str> {
        self.state.get("color_rgb")?.as_str()
    }

    pub fn effect(&self) -> Option<&str> {
        self.state.get("effect")?.as_str()
    }
}

/// A host-supplied action: pressing it PUTs `{}` to `action_url`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Button {
    pub name: String,
    pub action_url: String,
}

impl Button {
    pub fn new(name: impl Into<String>, action_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action_url: action_url.into(),
        }
    }

    /// Buttons from `{name: url}` entries, preserving entry order.
    ///
    /// Each entry is expected to hold exactly one pair; extra pairs become
    /// extra buttons rather than being dropped.
    pub fn from_entries<I, E>(entries: I) -> Vec<Self>
    where
        I: IntoIterator<Item = E>,
        E: IntoIterator<Item = (String, String)>,
    {
        entries
            .into_iter()
            .flat_map(|entry| entry.into_iter().map(|(name, url)| Self::new(name, url)))
            .collect()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
