// ── Group builder ──
//
// Pure derivation of the grouped view from the server's group list, the
// two thing collections, and the host's buttons.

use std::collections::{HashMap, HashSet};

use crate::model::{
    Button, Group, GroupAction, GroupMember, GroupedView, ServerGroup, Thing, OTHERS_GROUP,
};

/// Build the grouped view.
///
/// - Lights and switches join a group by appearing in its member list;
///   names the collections don't know are skipped. Within a group they are
///   sorted by name.
/// - Buttons join every group (except `Others`) whose name prefixes theirs,
///   after the things and in the order they were supplied.
/// - Groups left empty are dropped.
/// - Buttons no group claimed go to `Others`, created if needed.
/// - `Others` is always last; every other group keeps server order.
pub fn build_groups(
    server_groups: &[ServerGroup],
    lights: &[Thing],
    switches: &[Thing],
    buttons: &[Button],
) -> GroupedView {
    // Switches win a name clash, same as a later server record would.
    let things_by_name: HashMap<&str, &Thing> = lights
        .iter()
        .chain(switches)
        .map(|t| (t.name.as_str(), t))
        .collect();

    let mut groups: HashMap<String, Group> = HashMap::new();
    let mut ordered_names: Vec<String> = Vec::new();

    for server_group in server_groups {
        let mut things: Vec<&Thing> = server_group
            .members
            .iter()
            .filter_map(|name| things_by_name.get(name.as_str()).copied())
            .collect();
        things.sort_by(|a, b| a.name.cmp(&b.name));

        let mut members: Vec<GroupMember> = things
            .into_iter()
            .cloned()
            .map(GroupMember::Thing)
            .collect();

        if server_group.name != OTHERS_GROUP {
            members.extend(
                buttons
                    .iter()
                    .filter(|b| b.name.starts_with(&server_group.name))
                    .cloned()
                    .map(GroupMember::Button),
            );
        }

        if members.is_empty() {
            continue;
        }

        let group = Group {
            name: server_group.name.clone(),
            members,
            actions: actions_for(&server_group.name),
        };
        if groups.insert(server_group.name.clone(), group).is_none() {
            ordered_names.push(server_group.name.clone());
        }
    }

    let assigned: HashSet<&str> = groups
        .values()
        .flat_map(Group::buttons)
        .map(|b| b.name.as_str())
        .collect();
    let unassigned: Vec<GroupMember> = buttons
        .iter()
        .filter(|b| !assigned.contains(b.name.as_str()))
        .cloned()
        .map(GroupMember::Button)
        .collect();

    if !unassigned.is_empty() {
        let others = groups.entry(OTHERS_GROUP.to_owned()).or_insert_with(|| {
            ordered_names.push(OTHERS_GROUP.to_owned());
            Group {
                name: OTHERS_GROUP.to_owned(),
                members: Vec::new(),
                actions: actions_for(OTHERS_GROUP),
            }
        });
        others.members.extend(unassigned);
    }

    if let Some(idx) = ordered_names.iter().position(|n| n == OTHERS_GROUP) {
        let others = ordered_names.remove(idx);
        ordered_names.push(others);
    }

    GroupedView {
        groups,
        ordered_names,
    }
}

fn actions_for(group: &str) -> Vec<GroupAction> {
    if group == OTHERS_GROUP {
        Vec::new()
    } else {
        vec![GroupAction::AllOn, GroupAction::AllOff]
    }
}

// ── Tests ────────────────────────────────────────────────────────────
