// ── Store state ──
//
// Everything the store knows lives in one `StoreState` behind one
// `watch::Sender`. Mutations go through `send_modify`, so each one sees
// the current value and no two of them interleave.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::groups::build_groups;
use crate::live::ThingUpdate;
use crate::model::{
    Button, Collection, GroupedView, ServerGroup, StatePatch, Thing, ThingMetadata,
};

/// Point-in-time view of the store.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub lights: Vec<Thing>,
    pub switches: Vec<Thing>,
    pub metadata: HashMap<String, ThingMetadata>,
    pub server_groups: Vec<ServerGroup>,
    pub buttons: Vec<Button>,
    pub view: Arc<GroupedView>,
    /// True until the first collection has been committed.
    pub loading: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_push: Option<DateTime<Utc>>,
}

impl StoreState {
    pub(crate) fn new(buttons: Vec<Button>) -> Self {
        let mut state = Self {
            lights: Vec::new(),
            switches: Vec::new(),
            metadata: HashMap::new(),
            server_groups: Vec::new(),
            buttons,
            view: Arc::default(),
            loading: true,
            last_refresh: None,
            last_push: None,
        };
        state.rebuild_view();
        state
    }

    pub fn collection(&self, collection: Collection) -> &[Thing] {
        match collection {
            Collection::Lights => &self.lights,
            Collection::Switches => &self.switches,
        }
    }

    /// Look a light or switch up by name.
    pub fn thing(&self, name: &str) -> Option<&Thing> {
        self.lights
            .iter()
            .chain(&self.switches)
            .find(|t| t.name == name)
    }

    pub fn button(&self, name: &str) -> Option<&Button> {
        self.buttons.iter().find(|b| b.name == name)
    }

    pub fn metadata_for(&self, name: &str) -> Option<&ThingMetadata> {
        self.metadata.get(name)
    }

    // ── Mutations (crate-internal, always under `SharedState::modify`) ──

    pub(crate) fn replace_collection(&mut self, collection: Collection, things: Vec<Thing>) {
        match collection {
            Collection::Lights => self.lights = things,
            Collection::Switches => self.switches = things,
        }
    }

    /// Merge `patch` into every thing called `name`.
    ///
    /// Returns `None` if no such thing exists, otherwise whether anything
    /// changed.
    pub(crate) fn apply_patch(&mut self, name: &str, patch: &StatePatch) -> Option<bool> {
        let mut found = false;
        let mut changed = false;
        for thing in self
            .lights
            .iter_mut()
            .chain(self.switches.iter_mut())
            .filter(|t| t.name == name)
        {
            found = true;
            changed |= thing.merge_patch(patch);
        }
        found.then_some(changed)
    }

    /// Apply a batch of push updates. Unknown things are skipped.
    ///
    /// Returns how many updates changed something.
    pub(crate) fn apply_updates(&mut self, updates: &[ThingUpdate]) -> usize {
        let mut changed = 0;
        for update in updates {
            match self.apply_patch(&update.thing_name, &update.patch) {
                Some(true) => changed += 1,
                Some(false) => {}
                None => tracing::debug!(thing = %update.thing_name, "push update for unknown thing"),
            }
        }
        if changed > 0 {
            self.rebuild_view();
        }
        changed
    }

    pub(crate) fn rebuild_view(&mut self) {
        self.view = Arc::new(build_groups(
            &self.server_groups,
            &self.lights,
            &self.switches,
            &self.buttons,
        ));
    }
}

// ── SharedState ──────────────────────────────────────────────────────

/// The single owner of `StoreState`.
pub(crate) struct SharedState {
    tx: watch::Sender<Arc<StoreState>>,
}

impl SharedState {
    pub(crate) fn new(buttons: Vec<Button>) -> Self {
        let (tx, _) = watch::channel(Arc::new(StoreState::new(buttons)));
        Self { tx }
    }

    pub(crate) fn snapshot(&self) -> Arc<StoreState> {
        Arc::clone(&self.tx.borrow())
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<StoreState>> {
        self.tx.subscribe()
    }

    /// Run `f` against the current state and notify subscribers.
    ///
    /// Snapshots already handed out are unaffected: the state is cloned
    /// first if anyone still holds the old one.
    pub(crate) fn modify<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
        let mut out = None;
        self.tx.send_modify(|state| {
            out = Some(f(Arc::make_mut(state)));
        });
        match out {
            Some(value) => value,
            None => unreachable!("send_modify always runs its closure"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ThingKind;
    use serde_json::json;

    fn update(value: serde_json::Value) -> ThingUpdate {
        let patch = value.as_object().cloned().unwrap();
        ThingUpdate {
            thing_name: patch["thing_name"].as_str().unwrap().to_owned(),
            patch,
        }
    }

    #[test]
    fn unknown_thing_update_is_a_no_op() {
        let shared = SharedState::new(Vec::new());
        shared.modify(|s| {
            s.replace_collection(Collection::Lights, vec![Thing::new("Lamp", ThingKind::Light)]);
        });
        let before = shared.snapshot();

        let changed = shared.modify(|s| s.apply_updates(&[update(json!({ "thing_name": "Ghost", "state": true }))]));

        assert_eq!(changed, 0);
        let after = shared.snapshot();
        assert_eq!(after.lights, before.lights);
        assert!(after.thing("Ghost").is_none());
    }

    #[test]
    fn update_applies_to_current_state_and_rebuilds_view() {
        let shared = SharedState::new(Vec::new());
        shared.modify(|s| {
            s.server_groups = vec![ServerGroup { name: "Tv".into(), members: vec!["TvLamp".into()] }];
            s.replace_collection(Collection::Lights, vec![Thing::new("TvLamp", ThingKind::Light)]);
            s.rebuild_view();
        });
        let old = shared.snapshot();

        shared.modify(|s| s.apply_updates(&[update(json!({ "thing_name": "TvLamp", "brightness": 9 }))]));

        let new = shared.snapshot();
        assert_eq!(new.thing("TvLamp").unwrap().brightness(), Some(9));
        assert_eq!(old.thing("TvLamp").unwrap().brightness(), None);
        let member = &new.view.get("Tv").unwrap().members[0];
        assert!(matches!(member, crate::model::GroupMember::Thing(t) if t.brightness() == Some(9)));
    }
}
