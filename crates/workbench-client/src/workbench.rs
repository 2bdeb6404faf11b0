//! Process-wide workbench services
//!
//! Bundles the operation library, the query cache and the invalidation bus so
//! one value can be handed to every view. Mutations issued through it apply
//! the matching cache invalidations and bus publishes on success.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};
use workbench_interfaces::{AddColumnsPayload, Envelope, ModelForm, NullFillStrategy};

use crate::bus::{InvalidationBus, REFETCH_ALL_DATASETS, REFETCH_COMPONENT};
use crate::cache::{QueryCache, QueryKey};
use crate::config::ClientConfig;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::lifecycle::{CompletionPolicy, TrainingLifecycle};
use crate::operations::WorkbenchClient;
use crate::paths;

/// Envelope of a mutation plus where the UI should go next
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub envelope: Envelope<Value>,
    /// In-app path to show after a successful mutation
    pub navigate_to: Option<String>,
}

impl MutationOutcome {
    pub(crate) fn without_navigation(envelope: Envelope<Value>) -> Self {
        Self {
            envelope,
            navigate_to: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.envelope.is_ok()
    }
}

/// Shared services handed to every consumer
#[derive(Debug, Clone)]
pub struct Workbench {
    client: Arc<WorkbenchClient>,
    cache: Arc<QueryCache>,
    bus: InvalidationBus,
    policy: CompletionPolicy,
}

impl Workbench {
    pub fn new(client: Arc<WorkbenchClient>) -> Self {
        Self {
            cache: Arc::new(QueryCache::new(client.clone())),
            client,
            bus: InvalidationBus::new(),
            policy: CompletionPolicy::default(),
        }
    }

    /// Builds the HTTP stack described by `config`
    pub fn from_config(config: &ClientConfig) -> WorkbenchResult<Self> {
        let client = WorkbenchClient::from_config(config)?;
        info!(api_url = %config.api_url, "Workbench services initialized");
        Ok(Self::new(Arc::new(client)).with_policy(CompletionPolicy::from_config(config)))
    }

    pub fn with_policy(mut self, policy: CompletionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn client(&self) -> &Arc<WorkbenchClient> {
        &self.client
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn bus(&self) -> &InvalidationBus {
        &self.bus
    }

    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    /// Lifecycle for a new training run of `model`
    pub fn training(&self, dataset: &str, model: &str) -> WorkbenchResult<Arc<TrainingLifecycle>> {
        Ok(Arc::new(TrainingLifecycle::new(self.clone(), dataset, model, None)?))
    }

    /// Lifecycle tracking an existing job, e.g. when opening its page
    pub fn attach_training(
        &self,
        dataset: &str,
        model: &str,
        train_job_id: &str,
    ) -> WorkbenchResult<Arc<TrainingLifecycle>> {
        if train_job_id.is_empty() {
            return Err(WorkbenchError::empty_identifier("train job id"));
        }
        Ok(Arc::new(TrainingLifecycle::new(
            self.clone(),
            dataset,
            model,
            Some(train_job_id.to_string()),
        )?))
    }

    /// Validates `form` locally, then creates the model
    #[instrument(skip(self, form), fields(model = %form.name))]
    pub async fn create_model(&self, dataset: &str, form: &ModelForm) -> WorkbenchResult<MutationOutcome> {
        form.validate()?;
        let envelope = self.client.create_model(dataset, form).await?;
        if !envelope.is_ok() {
            warn!(status = envelope.status(), error = ?envelope.error(), "Model creation rejected");
            return Ok(MutationOutcome::without_navigation(envelope));
        }

        self.cache.invalidate(&QueryKey::DatasetModels(dataset.to_string()));
        self.cache.invalidate(&QueryKey::Model(form.name.clone()));
        self.bus.publish(REFETCH_COMPONENT);

        Ok(MutationOutcome {
            envelope,
            navigate_to: paths::model_info_path(dataset, &form.name).ok(),
        })
    }

    /// Renames a column; cached column lookups of the dataset are dropped
    #[instrument(skip(self))]
    pub async fn rename_column(
        &self,
        dataset: &str,
        old_name: &str,
        new_name: &str,
    ) -> WorkbenchResult<MutationOutcome> {
        let envelope = self.client.rename_column_name(dataset, old_name, new_name).await?;
        if !envelope.is_ok() {
            warn!(status = envelope.status(), error = ?envelope.error(), "Column rename rejected");
            return Ok(MutationOutcome::without_navigation(envelope));
        }

        // Both names may hold stale answers, including a cached miss for the new one
        self.cache.invalidate_where(|key| key.is_column_of(dataset));
        self.cache.invalidate(&QueryKey::Dataset(dataset.to_string()));
        self.bus.publish(REFETCH_ALL_DATASETS);

        Ok(MutationOutcome {
            envelope,
            navigate_to: paths::dataset_column_path(dataset, new_name).ok(),
        })
    }

    #[instrument(skip(self, code))]
    pub async fn exec_python_on_column(
        &self,
        dataset: &str,
        column: &str,
        code: &str,
    ) -> WorkbenchResult<MutationOutcome> {
        let envelope = self.client.exec_python_on_dataset_col(dataset, column, code).await?;
        if envelope.is_ok() {
            self.cache.invalidate(&QueryKey::column(dataset, column));
            self.cache.invalidate(&QueryKey::Dataset(dataset.to_string()));
            self.bus.publish(REFETCH_COMPONENT);
        }
        Ok(MutationOutcome::without_navigation(envelope))
    }

    #[instrument(skip(self, code))]
    pub async fn exec_python_on_dataset(
        &self,
        dataset: &str,
        code: &str,
        null_fill_strategy: NullFillStrategy,
    ) -> WorkbenchResult<MutationOutcome> {
        let envelope = self
            .client
            .exec_python_on_dataset(dataset, code, null_fill_strategy)
            .await?;
        if envelope.is_ok() {
            self.cache.invalidate_where(|key| key.touches_dataset(dataset));
            self.bus.publish(REFETCH_ALL_DATASETS);
            self.bus.publish(REFETCH_COMPONENT);
        }
        Ok(MutationOutcome::without_navigation(envelope))
    }

    #[instrument(skip(self, payload))]
    pub async fn add_columns(&self, dataset: &str, payload: &AddColumnsPayload) -> WorkbenchResult<MutationOutcome> {
        let envelope = self.client.add_columns_to_dataset(dataset, payload).await?;
        if !envelope.is_ok() {
            return Ok(MutationOutcome::without_navigation(envelope));
        }

        self.cache.invalidate_where(|key| key.touches_dataset(dataset));
        self.cache.invalidate(&QueryKey::Datasets);
        self.bus.publish(REFETCH_ALL_DATASETS);

        Ok(MutationOutcome {
            envelope,
            navigate_to: paths::dataset_info_path(dataset).ok(),
        })
    }

    /// Drops all subscriptions and cached values
    pub fn shutdown(&self) {
        self.bus.shutdown();
        self.cache.clear();
        info!("Workbench services shut down");
    }
}
