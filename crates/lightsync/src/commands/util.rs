//! Shared helpers for command handlers.

use lightsync_core::{
    GroupedView, HttpThingsStore, RefreshReport, Thing, ThingFilter, ThingKind,
};
use tabled::Tabled;

use crate::cli::{FilterArgs, GlobalOpts, KindArg};
use crate::error::CliError;
use crate::output;

/// Run one refresh, surfacing partial failures as warnings.
pub async fn refresh(store: &HttpThingsStore, global: &GlobalOpts) -> Result<RefreshReport, CliError> {
    let report = store.refresh().await?;
    warn_incomplete(&report, global);
    Ok(report)
}

/// Print collection and metadata failures from a refresh to stderr.
pub fn warn_incomplete(report: &RefreshReport, global: &GlobalOpts) {
    if global.quiet || report.is_complete() {
        return;
    }
    for collection in &report.collections {
        match &collection.outcome {
            Err(e) => eprintln!("warning: {} not refreshed: {e}", collection.collection),
            Ok(stats) if !stats.metadata_failed.is_empty() => eprintln!(
                "warning: no metadata for {}",
                stats.metadata_failed.join(", ")
            ),
            Ok(_) => {}
        }
    }
}

/// Translate `FilterArgs` into store filters; a thing must match all of them.
pub fn filters(args: &FilterArgs) -> Vec<ThingFilter> {
    let mut filters = Vec::new();
    if let Some(kind) = args.kind {
        filters.push(ThingFilter::ByKind(match kind {
            KindArg::Light => ThingKind::Light,
            KindArg::Switch => ThingKind::Switch,
        }));
    }
    if let Some(ref prefix) = args.group {
        filters.push(ThingFilter::ByPrefix(prefix.clone()));
    }
    if args.on {
        filters.push(ThingFilter::On);
    }
    if args.off {
        filters.push(ThingFilter::Off);
    }
    filters
}

pub fn matches_all(filters: &[ThingFilter], thing: &Thing) -> bool {
    filters.iter().all(|f| f.matches(thing))
}

/// Name of the group a thing is displayed in.
pub fn group_of<'a>(view: &'a GroupedView, name: &str) -> &'a str {
    view.iter()
        .find(|g| g.members.iter().any(|m| m.name() == name))
        .map_or("-", |g| g.name.as_str())
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct ThingRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Brightness")]
    pub brightness: String,
    #[tabled(rename = "Color")]
    pub color: String,
}

impl ThingRow {
    pub fn new(thing: &Thing, group: &str, color: bool) -> Self {
        Self {
            name: thing.name.clone(),
            kind: thing.kind.to_string(),
            group: group.to_owned(),
            state: output::paint_state(thing.is_on(), color),
            brightness: thing
                .brightness()
                .map_or_else(|| "-".into(), |b| b.to_string()),
            color: describe_color(thing),
        }
    }
}

fn describe_color(thing: &Thing) -> String {
    if let Some(rgb) = thing.color_rgb() {
        return rgb.to_owned();
    }
    if let Some(mireds) = thing.color_temp() {
        return format!("{mireds} mired");
    }
    thing.effect().map_or_else(|| "-".into(), str::to_owned)
}
