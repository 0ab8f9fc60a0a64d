// ── API-to-domain type conversions ──
//
// Bridges raw `lightsync_api` wire records into canonical
// `lightsync_core::model` types. Conversions are lossless for the fields
// the domain keeps; action descriptors are copied whole and narrowed later
// by the metadata fetcher.

use lightsync_api::{GroupRecord, MetadataRecord, ThingRecord};

use crate::model::{ServerGroup, Thing, ThingKind, ThingMetadata};

// ── Groups ─────────────────────────────────────────────────────────

impl From<GroupRecord> for ServerGroup {
    fn from(record: GroupRecord) -> Self {
        Self {
            name: record.name,
            members: record.members,
        }
    }
}

// ── Things ─────────────────────────────────────────────────────────

/// Build a [`Thing`] of the given kind from a wire record.
pub fn thing_from_record(record: ThingRecord, kind: ThingKind) -> Thing {
    Thing {
        name: record.thing_name,
        kind,
        state: record.fields,
    }
}

// ── Metadata ───────────────────────────────────────────────────────

impl From<MetadataRecord> for ThingMetadata {
    fn from(record: MetadataRecord) -> Self {
        Self {
            description: record.description,
            model: record.model,
            name: record.name,
            real_name: record.real_name,
            thing_type: record.thing_type,
            thing_id: record.thing_id,
            address: record.address,
            actions: record.actions.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_becomes_thing_without_identity_field() {
        let record: ThingRecord =
            serde_json::from_value(json!({ "thing_name": "Hall", "state": true })).unwrap();
        let thing = thing_from_record(record, ThingKind::Switch);
        assert_eq!(thing.name, "Hall");
        assert_eq!(thing.kind, ThingKind::Switch);
        assert_eq!(thing.is_on(), Some(true));
        assert!(thing.field("thing_name").is_none());
    }

    #[test]
    fn metadata_without_actions_gets_empty_map() {
        let record: MetadataRecord =
            serde_json::from_value(json!({ "name": "Hall", "thing_type": "switch" })).unwrap();
        let meta = ThingMetadata::from(record);
        assert_eq!(meta.thing_type.as_deref(), Some("switch"));
        assert!(meta.actions.is_empty());
    }
}
