// ── Full refresh ──
//
// Groups first, then lights and switches concurrently. Each collection
// does its network work without touching the state, merges its metadata
// into the cache, then commits its results in one `SharedState::modify`.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::ThingsStore;
use crate::cache::META_KEY;
use crate::error::CoreError;
use crate::fetcher::fetch_metadata;
use crate::model::{Collection, Thing, ThingMetadata};
use crate::transport::{PushTransport, RequestLayer};

/// What one collection refresh did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub things: usize,
    /// Whether the stored metadata hash matched the server's.
    pub cache_hit: bool,
    pub metadata_reused: usize,
    pub metadata_fetched: usize,
    /// Things whose metadata request failed; retried next refresh.
    pub metadata_failed: Vec<String>,
}

/// Outcome of one collection within a refresh.
#[derive(Debug)]
pub struct CollectionReport {
    pub collection: Collection,
    pub outcome: Result<CollectionStats, CoreError>,
}

/// Outcome of [`ThingsStore::refresh`].
#[derive(Debug)]
pub struct RefreshReport {
    pub groups: usize,
    pub collections: Vec<CollectionReport>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.collections.iter().all(|c| {
            c.outcome
                .as_ref()
                .is_ok_and(|stats| stats.metadata_failed.is_empty())
        })
    }

    pub fn stats(&self, collection: Collection) -> Option<&CollectionStats> {
        self.collections
            .iter()
            .find(|c| c.collection == collection)
            .and_then(|c| c.outcome.as_ref().ok())
    }
}

impl<R: RequestLayer, P: PushTransport> ThingsStore<R, P> {
    /// Refetch groups, things, and whatever metadata the cache can't supply.
    ///
    /// A failed group fetch aborts the refresh with state unchanged. After
    /// that, each collection succeeds or fails on its own; failures are
    /// reported in the returned report and as notices.
    pub async fn refresh(&self) -> Result<RefreshReport, CoreError> {
        self.ensure_running()?;
        debug!("refreshing things");

        let server_groups = match self.inner.requests.groups().await {
            Ok(groups) => groups,
            Err(e) => {
                self.notify_read_failure("fetch groups", &e);
                return Err(e);
            }
        };
        self.ensure_running()?;

        let groups = server_groups.len();
        self.inner.shared.modify(|state| {
            state.server_groups = server_groups;
            state.rebuild_view();
        });

        let (lights, switches) = tokio::join!(
            self.refresh_collection(Collection::Lights),
            self.refresh_collection(Collection::Switches),
        );

        let collections = vec![
            CollectionReport {
                collection: Collection::Lights,
                outcome: lights,
            },
            CollectionReport {
                collection: Collection::Switches,
                outcome: switches,
            },
        ];
        for report in &collections {
            if let Err(e) = &report.outcome {
                if !matches!(e, CoreError::Stopped) {
                    self.notify_read_failure(&format!("refresh {}", report.collection), e);
                }
            }
        }

        let report = RefreshReport {
            groups,
            collections,
        };
        info!(groups, complete = report.is_complete(), "refresh finished");
        Ok(report)
    }

    async fn refresh_collection(&self, collection: Collection) -> Result<CollectionStats, CoreError> {
        let requests = &self.inner.requests;
        let cache = &self.inner.cache;

        let things = requests.things(collection).await?;
        let server_hash = requests.metadata_hash().await?;

        let cache_hit = cache.stored_hash().as_deref() == Some(server_hash.as_str());
        let cached: HashMap<String, ThingMetadata> = if cache_hit {
            cache.cache_get(META_KEY).unwrap_or_default()
        } else {
            debug!(%collection, "metadata hash changed, refetching all metadata");
            HashMap::new()
        };

        let (known, unknown): (Vec<&Thing>, Vec<&Thing>) =
            things.iter().partition(|t| cached.contains_key(&t.name));
        let batch = fetch_metadata(requests.as_ref(), unknown).await;

        // Anything that lands after stop() is dropped.
        self.ensure_running()?;

        let mut metadata: HashMap<String, ThingMetadata> = known
            .iter()
            .filter_map(|t| Some((t.name.clone(), cached.get(&t.name)?.clone())))
            .collect();
        let stats = CollectionStats {
            things: things.len(),
            cache_hit,
            metadata_reused: metadata.len(),
            metadata_fetched: batch.fetched.len(),
            metadata_failed: batch.failed.iter().map(|(name, _)| name.clone()).collect(),
        };

        // Persisted under the server hash, outside the state lock.
        cache.merge_hashed(META_KEY, &server_hash, &batch.fetched);

        self.inner.shared.modify(|state| {
            metadata.extend(batch.fetched);
            state.metadata.extend(metadata);
            state.replace_collection(collection, things);
            state.loading = false;
            state.last_refresh = Some(Utc::now());
            state.rebuild_view();
        });

        if !stats.metadata_failed.is_empty() {
            warn!(
                %collection,
                failed = stats.metadata_failed.len(),
                "some metadata could not be fetched"
            );
        }
        debug!(%collection, ?stats, "collection committed");
        Ok(stats)
    }
}
