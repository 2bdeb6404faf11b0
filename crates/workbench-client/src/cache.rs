//! Query cache
//!
//! Remembers the last fetched value per query key. Concurrent refetches of the
//! same key are not coalesced: whichever response lands last is kept. A
//! response whose request started before the key was invalidated is returned to
//! its caller but never stored.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};
use workbench_interfaces::{
    ColumnDetail, DatasetDetail, DatasetList, DatasetModel, DatasetModelList, Envelope, TickerList,
    TrainJobDetailed, TrainingMetadata,
};

use crate::bus::{InvalidationBus, Subscription};
use crate::error::WorkbenchResult;
use crate::operations::WorkbenchClient;

/// Identifies one cached read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Datasets,
    Dataset(String),
    Column { dataset: String, column: String },
    Tickers,
    DatasetModels(String),
    Model(String),
    TrainingMetadata(String),
    TrainJob(String),
}

impl QueryKey {
    pub fn column(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        QueryKey::Column {
            dataset: dataset.into(),
            column: column.into(),
        }
    }

    /// Whether this key reads a column of `dataset`
    pub fn is_column_of(&self, dataset: &str) -> bool {
        matches!(self, QueryKey::Column { dataset: ds, .. } if ds == dataset)
    }

    /// Whether this key reads anything belonging to `dataset`
    pub fn touches_dataset(&self, dataset: &str) -> bool {
        match self {
            QueryKey::Dataset(ds) | QueryKey::DatasetModels(ds) => ds == dataset,
            QueryKey::Column { dataset: ds, .. } => ds == dataset,
            _ => false,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Datasets => write!(f, "datasets"),
            QueryKey::Dataset(ds) => write!(f, "dataset:{}", ds),
            QueryKey::Column { dataset, column } => write!(f, "column:{}/{}", dataset, column),
            QueryKey::Tickers => write!(f, "tickers"),
            QueryKey::DatasetModels(ds) => write!(f, "dataset-models:{}", ds),
            QueryKey::Model(name) => write!(f, "model:{}", name),
            QueryKey::TrainingMetadata(name) => write!(f, "training-metadata:{}", name),
            QueryKey::TrainJob(id) => write!(f, "train-job:{}", id),
        }
    }
}

/// A cached read result, one variant per [`QueryKey`] kind
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Datasets(Envelope<DatasetList>),
    Dataset(Envelope<DatasetDetail>),
    Column(Envelope<ColumnDetail>),
    Tickers(Envelope<TickerList>),
    DatasetModels(Envelope<DatasetModelList>),
    Model(Option<DatasetModel>),
    TrainingMetadata(Option<Vec<TrainingMetadata>>),
    TrainJob(Option<TrainJobDetailed>),
}

impl Resource {
    pub fn as_column(&self) -> Option<&ColumnDetail> {
        match self {
            Resource::Column(env) => env.res(),
            _ => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&DatasetDetail> {
        match self {
            Resource::Dataset(env) => env.res(),
            _ => None,
        }
    }

    pub fn as_train_job(&self) -> Option<&TrainJobDetailed> {
        match self {
            Resource::TrainJob(detail) => detail.as_ref(),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&DatasetModel> {
        match self {
            Resource::Model(model) => model.as_ref(),
            _ => None,
        }
    }
}

/// What the cache knows about one key
#[derive(Debug, Clone)]
pub enum QueryState {
    NotLoaded,
    Loaded {
        value: Arc<Resource>,
        fetched_at: DateTime<Utc>,
    },
}

impl QueryState {
    pub fn value(&self) -> Option<&Arc<Resource>> {
        match self {
            QueryState::Loaded { value, .. } => Some(value),
            QueryState::NotLoaded => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, QueryState::Loaded { .. })
    }
}

struct CacheEntry {
    value: Arc<Resource>,
    fetched_at: DateTime<Utc>,
    generation: u64,
}

#[derive(Default)]
struct Entries {
    values: HashMap<QueryKey, CacheEntry>,
    /// Refetches awaiting the backend, per key
    pending: HashMap<QueryKey, usize>,
    /// Last invalidation seen while a refetch of the key was pending
    invalidated_at: HashMap<QueryKey, u64>,
}

impl Entries {
    fn remove(&mut self, key: &QueryKey, generation: u64) -> bool {
        if self.pending.contains_key(key) {
            self.invalidated_at.insert(key.clone(), generation);
        }
        self.values.remove(key).is_some()
    }

    fn begin(&mut self, key: &QueryKey) {
        *self.pending.entry(key.clone()).or_insert(0) += 1;
    }

    /// Settles one refetch; returns whether it started before an invalidation
    fn finish(&mut self, key: &QueryKey, started: u64) -> bool {
        let stale = self
            .invalidated_at
            .get(key)
            .is_some_and(|invalidated| *invalidated > started);

        let done = match self.pending.get_mut(key) {
            Some(count) => {
                *count -= 1;
                *count == 0
            }
            None => true,
        };
        if done {
            self.pending.remove(key);
            self.invalidated_at.remove(key);
        }
        stale
    }
}

/// Keyed cache over the operation library
pub struct QueryCache {
    client: Arc<WorkbenchClient>,
    entries: RwLock<Entries>,
    generation: AtomicU64,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_struct("QueryCache")
            .field("entries", &entries.values.len())
            .field("pending", &entries.pending.len())
            .finish()
    }
}

impl QueryCache {
    pub fn new(client: Arc<WorkbenchClient>) -> Self {
        Self {
            client,
            entries: RwLock::new(Entries::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn client(&self) -> &Arc<WorkbenchClient> {
        &self.client
    }

    /// Cached state of `key`, without touching the network
    pub fn get(&self, key: &QueryKey) -> QueryState {
        match self.entries.read().values.get(key) {
            Some(entry) => QueryState::Loaded {
                value: entry.value.clone(),
                fetched_at: entry.fetched_at,
            },
            None => QueryState::NotLoaded,
        }
    }

    /// Cached value of `key`, loading it first if absent
    pub async fn fetch(&self, key: &QueryKey) -> WorkbenchResult<Arc<Resource>> {
        if let Some(value) = self.get(key).value() {
            return Ok(value.clone());
        }
        self.refetch(key).await
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Loads `key` from the backend and stores the result.
    ///
    /// The lock is only taken to register the request and to store; overlapping
    /// refetches each store their own response in landing order. A response to a
    /// request that started before `key` was invalidated is not stored.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn refetch(&self, key: &QueryKey) -> WorkbenchResult<Arc<Resource>> {
        let started = {
            let mut entries = self.entries.write();
            entries.begin(key);
            self.next_generation()
        };

        let loaded = self.load(key).await;

        let mut entries = self.entries.write();
        let stale = entries.finish(key, started);
        let value = Arc::new(loaded?);
        if stale {
            debug!(started, "Discarding response requested before invalidation");
            return Ok(value);
        }

        let generation = self.next_generation();
        let previous = entries.values.insert(
            key.clone(),
            CacheEntry {
                value: value.clone(),
                fetched_at: Utc::now(),
                generation,
            },
        );

        debug!(
            generation,
            replaced = ?previous.map(|p| p.generation),
            "Query refetched"
        );
        Ok(value)
    }

    /// Drops the cached value of `key`; returns whether one was present.
    ///
    /// Refetches of `key` already in flight will not store their response.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut entries = self.entries.write();
        let generation = self.next_generation();
        let removed = entries.remove(key, generation);
        if removed {
            debug!(key = %key, "Query invalidated");
        }
        removed
    }

    /// Drops every cached or pending key matching `predicate`
    pub fn invalidate_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&QueryKey) -> bool,
    {
        let mut entries = self.entries.write();
        let generation = self.next_generation();
        let keys: Vec<QueryKey> = entries
            .values
            .keys()
            .chain(entries.pending.keys())
            .filter(|key| predicate(key))
            .cloned()
            .collect();

        keys.iter()
            .filter(|key| entries.remove(key, generation))
            .count()
    }

    /// Keys currently holding a value
    pub fn keys(&self) -> Vec<QueryKey> {
        self.entries.read().values.keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.invalidate_where(|_| true);
    }

    /// Refetches `key` every time `channel` is published.
    ///
    /// The subscription only holds a weak reference to the cache.
    pub fn bind(self: &Arc<Self>, bus: &InvalidationBus, channel: &str, key: QueryKey) -> Subscription {
        let cache: Weak<Self> = Arc::downgrade(self);
        bus.subscribe(channel, move || {
            let cache = cache.clone();
            let key = key.clone();
            async move {
                let Some(cache) = cache.upgrade() else {
                    return;
                };
                if let Err(e) = cache.refetch(&key).await {
                    warn!(key = %key, "Bound refetch failed: {}", e);
                }
            }
        })
    }

    async fn load(&self, key: &QueryKey) -> WorkbenchResult<Resource> {
        let client = &self.client;
        Ok(match key {
            QueryKey::Datasets => Resource::Datasets(client.fetch_datasets().await?),
            QueryKey::Dataset(ds) => Resource::Dataset(client.fetch_dataset(ds).await?),
            QueryKey::Column { dataset, column } => {
                Resource::Column(client.fetch_column(dataset, column).await?)
            }
            QueryKey::Tickers => Resource::Tickers(client.fetch_all_tickers().await?),
            QueryKey::DatasetModels(ds) => {
                Resource::DatasetModels(client.fetch_dataset_models(ds).await?)
            }
            QueryKey::Model(name) => Resource::Model(client.fetch_model_by_name(name).await?),
            QueryKey::TrainingMetadata(name) => {
                Resource::TrainingMetadata(client.fetch_all_training_metadata_for_model(name).await?)
            }
            QueryKey::TrainJob(id) => Resource::TrainJob(client.fetch_trainjob_detailed(id).await?),
        })
    }
}
