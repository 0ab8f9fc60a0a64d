// ── Metadata fetcher ──
//
// Fan-out of one metadata request per thing, joined before returning.
// Successes and failures come back separately: a failed thing is simply
// absent from `fetched` and gets retried on the next refresh.

use std::collections::HashMap;

use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Thing, ThingMetadata, ACTION_WHITELIST};
use crate::transport::RequestLayer;

/// Result of one metadata fan-out.
#[derive(Debug, Default)]
pub struct MetadataBatch {
    /// Filtered metadata, keyed by thing name.
    pub fetched: HashMap<String, ThingMetadata>,
    /// Things whose request failed, with the reason.
    pub failed: Vec<(String, CoreError)>,
}

/// Drop every action descriptor outside [`ACTION_WHITELIST`], and any
/// whitelisted one whose descriptor is empty (`null`, `false`, `0`, `""`).
pub fn filter_metadata(mut meta: ThingMetadata) -> ThingMetadata {
    meta.actions.retain(|action, descriptor| {
        ACTION_WHITELIST.contains(&action.as_str()) && is_present(descriptor)
    });
    meta
}

fn is_present(descriptor: &Value) -> bool {
    match descriptor {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Fetch and filter metadata for every thing in `things`, concurrently.
pub async fn fetch_metadata<'a, R, I>(requests: &R, things: I) -> MetadataBatch
where
    R: RequestLayer,
    I: IntoIterator<Item = &'a Thing>,
{
    let names: Vec<&str> = things.into_iter().map(|t| t.name.as_str()).collect();
    if names.is_empty() {
        return MetadataBatch::default();
    }
    debug!(count = names.len(), "fetching thing metadata");

    let results = join_all(names.iter().map(|name| requests.metadata(name))).await;

    let mut batch = MetadataBatch::default();
    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(meta) => {
                batch.fetched.insert(name.to_owned(), filter_metadata(meta));
            }
            Err(e) => {
                warn!(thing = name, error = %e, "metadata fetch failed");
                batch.failed.push((name.to_owned(), e));
            }
        }
    }
    batch
}
