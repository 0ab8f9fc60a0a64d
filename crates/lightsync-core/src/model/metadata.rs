// ── Thing metadata ──
//
// Descriptive record for a thing. Persisted in the local cache, so the
// serde shape here is also the on-disk shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The only action descriptors kept from a raw metadata record.
pub const ACTION_WHITELIST: [&str; 5] = ["brightness", "color_rgb", "color_temp", "effect", "state"];

/// Filtered metadata for one thing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThingMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    /// Device-type tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thing_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thing_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Value>,
    /// Action descriptors, keyed by whitelisted action name.
    #[serde(default)]
    pub actions: Map<String, Value>,
}

impl ThingMetadata {
    pub fn supports(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    /// `(min, max)` of the color temperature control, if advertised.
    pub fn color_temp_range(&self) -> Option<(u64, u64)> {
        let meta = self.action_meta("color_temp")?;
        Some((meta.get("value_min")?.as_u64()?, meta.get("value_max")?.as_u64()?))
    }

    /// Named color temperature presets as `(name, value)`.
    pub fn color_temp_presets(&self) -> Vec<(String, Value)> {
        self.action_meta("color_temp")
            .and_then(|meta| meta.get("presets"))
            .and_then(Value::as_array)
            .map(|presets| {
                presets
                    .iter()
                    .filter_map(|p| {
                        let name = p.get("name")?.as_str()?.to_owned();
                        Some((name, p.get("value")?.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Effects the device accepts.
    pub fn effect_values(&self) -> Vec<String> {
        self.action_meta("effect")
            .and_then(|meta| meta.get("values"))
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `value.meta` object of an action descriptor.
    fn action_meta(&self, action: &str) -> Option<&Map<String, Value>> {
        self.actions
            .get(action)?
            .get("value")?
            .get("meta")?
            .as_object()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lamp_meta() -> ThingMetadata {
        serde_json::from_value(json!({
            "name": "TVRoomLamp",
            "actions": {
                "color_temp": { "value": { "meta": {
                    "value_min": 150, "value_max": 500,
                    "presets": [{ "name": "warm", "value": 454 }, { "bogus": true }]
                }}},
                "effect": { "value": { "meta": { "values": ["blink", "breathe"] } } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn reads_color_temp_descriptor() {
        let meta = lamp_meta();
        assert_eq!(meta.color_temp_range(), Some((150, 500)));
        assert_eq!(meta.color_temp_presets(), vec![("warm".to_string(), json!(454))]);
    }

    #[test]
    fn reads_effect_values() {
        let meta = lamp_meta();
        assert!(meta.supports("effect"));
        assert!(!meta.supports("color_rgb"));
        assert_eq!(meta.effect_values(), vec!["blink", "breathe"]);
    }

    #[test]
    fn missing_descriptor_yields_nothing() {
        let meta = ThingMetadata::default();
        assert_eq!(meta.color_temp_range(), None);
        assert!(meta.effect_values().is_empty());
    }
}
