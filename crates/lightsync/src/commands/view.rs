//! Read-only views over the refreshed store: groups, things, metadata.

use serde::Serialize;
use tabled::Tabled;

use lightsync_core::{CoreError, Group, GroupMember, HttpThingsStore, Thing, ThingMetadata};

use crate::cli::{GlobalOpts, GroupsArgs, OutputFormat, ThingsArgs};
use crate::error::CliError;
use crate::output;

use super::util::{self, ThingRow};

// ── Groups ──────────────────────────────────────────────────────────

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Member")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Brightness")]
    brightness: String,
}

/// One row per member, in display order.
#[derive(Serialize)]
struct MemberLine<'a> {
    group: &'a str,
    label: String,
    member: &'a GroupMember,
}

fn member_lines(group: &Group) -> impl Iterator<Item = MemberLine<'_>> {
    group.members.iter().map(move |member| MemberLine {
        group: &group.name,
        label: group.member_label(member),
        member,
    })
}

pub fn groups(
    store: &HttpThingsStore,
    args: GroupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = store.view();
    let color = output::should_color(&global.color);

    let selected: Vec<&Group> = match args.name {
        Some(ref name) => vec![view.get(name).ok_or_else(|| CoreError::GroupNotFound {
            name: name.clone(),
        })?],
        None => view.iter().collect(),
    };

    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let lines: Vec<MemberLine<'_>> =
                selected.iter().flat_map(|g| member_lines(g)).collect();
            output::render_list(
                &global.output,
                &lines,
                |line| member_row(line, color),
                |line| format!("{}\t{}", line.group, line.member.name()),
            )?
        }
        // Structured formats serialize whole groups, actions included.
        _ => output::render_single(&global.output, &selected, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn member_row(line: &MemberLine<'_>, color: bool) -> MemberRow {
    let (state, brightness) = match line.member {
        GroupMember::Thing(thing) => (
            output::paint_state(thing.is_on(), color),
            thing
                .brightness()
                .map_or_else(|| "-".into(), |b| b.to_string()),
        ),
        GroupMember::Button(_) => ("-".into(), "-".into()),
    };
    MemberRow {
        group: line.group.to_owned(),
        label: line.label.clone(),
        kind: line.member.kind().to_string(),
        state,
        brightness,
    }
}

// ── Things ──────────────────────────────────────────────────────────

pub fn things(
    store: &HttpThingsStore,
    args: ThingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = store.snapshot();
    let filters = util::filters(&args.filter);
    let color = output::should_color(&global.color);

    let mut things: Vec<&Thing> = snapshot
        .lights
        .iter()
        .chain(snapshot.switches.iter())
        .filter(|t| util::matches_all(&filters, t))
        .collect();
    things.sort_by(|a, b| a.name.cmp(&b.name));

    let out = output::render_list(
        &global.output,
        &things,
        |t| ThingRow::new(t, util::group_of(&snapshot.view, &t.name), color),
        |t| t.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Metadata ────────────────────────────────────────────────────────

pub fn meta(store: &HttpThingsStore, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = store.snapshot();
    if snapshot.thing(name).is_none() {
        return Err(CoreError::ThingNotFound { name: name.into() }.into());
    }
    let meta = snapshot
        .metadata_for(name)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "metadata".into(),
            identifier: name.into(),
            list_command: "cache clear".into(),
        })?;

    let out = output::render_single(&global.output, meta, |m| detail(name, m), |_| name.into())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(name: &str, m: &ThingMetadata) -> String {
    let mut lines = vec![
        format!("Name:        {}", m.name.as_deref().unwrap_or(name)),
        format!("Model:       {}", m.model.as_deref().unwrap_or("-")),
        format!("Type:        {}", m.thing_type.as_deref().unwrap_or("-")),
        format!("Description: {}", m.description.as_deref().unwrap_or("-")),
    ];
    let actions: Vec<&str> = m.actions.keys().map(String::as_str).collect();
    lines.push(format!(
        "Actions:     {}",
        if actions.is_empty() { "-".into() } else { actions.join(", ") }
    ));
    if let Some((min, max)) = m.color_temp_range() {
        lines.push(format!("Color temp:  {min}-{max} mired"));
    }
    let presets = m.color_temp_presets();
    if !presets.is_empty() {
        let names: Vec<&str> = presets.iter().map(|(n, _)| n.as_str()).collect();
        lines.push(format!("Presets:     {}", names.join(", ")));
    }
    let effects = m.effect_values();
    if !effects.is_empty() {
        lines.push(format!("Effects:     {}", effects.join(", ")));
    }
    lines.join("\n")
}
