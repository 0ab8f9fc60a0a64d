// ── Groups and the grouped view ──

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::thing::{Button, Thing, ThingKind};

/// Catch-all group. Never gets group actions, never matches buttons by
/// prefix, and is always displayed last.
pub const OTHERS_GROUP: &str = "Others";

/// A server-declared group: its name doubles as a name prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerGroup {
    pub name: String,
    pub members: Vec<String>,
}

/// Synthesized whole-group action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GroupAction {
    AllOn,
    AllOff,
}

/// One entry in a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GroupMember {
    Thing(Thing),
    Button(Button),
}

impl GroupMember {
    pub fn name(&self) -> &str {
        match self {
            Self::Thing(t) => &t.name,
            Self::Button(b) => &b.name,
        }
    }

    pub fn kind(&self) -> ThingKind {
        match self {
            Self::Thing(t) => t.kind,
            Self::Button(_) => ThingKind::Button,
        }
    }
}

/// A named, ordered group of members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub members: Vec<GroupMember>,
    pub actions: Vec<GroupAction>,
}

impl Group {
    pub fn things(&self, kind: ThingKind) -> impl Iterator<Item = &Thing> {
        self.members.iter().filter_map(move |m| match m {
            GroupMember::Thing(t) if t.kind == kind => Some(t),
            _ => None,
        })
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.members.iter().filter_map(|m| match m {
            GroupMember::Button(b) => Some(b),
            GroupMember::Thing(_) => None,
        })
    }

    /// Short label for a member: the group prefix is stripped, and for
    /// buttons underscores become spaces.
    pub fn member_label(&self, member: &GroupMember) -> String {
        let name = member.name();
        let short = name.strip_prefix(self.name.as_str()).unwrap_or(name);
        match member {
            GroupMember::Button(_) => short.replace('_', " ").trim().to_owned(),
            GroupMember::Thing(_) => short.to_owned(),
        }
    }
}

/// Derived, display-ready grouping of everything the store knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedView {
    pub groups: HashMap<String, Group>,
    pub ordered_names: Vec<String>,
}

impl GroupedView {
    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Groups in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.ordered_names.iter().filter_map(|n| self.groups.get(n))
    }

    pub fn len(&self) -> usize {
        self.ordered_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_label_strips_prefix() {
        let group = Group {
            name: "Kitchen".into(),
            members: Vec::new(),
            actions: Vec::new(),
        };
        let light = GroupMember::Thing(Thing::new("KitchenCeiling", ThingKind::Light));
        let button = GroupMember::Button(Button::new("Kitchen_Night_Mode", "http://h/x"));
        let other = GroupMember::Thing(Thing::new("Hallway", ThingKind::Switch));

        assert_eq!(group.member_label(&light), "Ceiling");
        assert_eq!(group.member_label(&button), "Night Mode");
        assert_eq!(group.member_label(&other), "Hallway");
    }

    #[test]
    fn group_action_names() {
        assert_eq!(GroupAction::AllOn.to_string(), "all-on");
        assert_eq!("all-off".parse::<GroupAction>().ok(), Some(GroupAction::AllOff));
    }
}
