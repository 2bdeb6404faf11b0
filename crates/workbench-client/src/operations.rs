//! Operation library
//!
//! One entry point per backend capability. Each composes the endpoint
//! resolver, the request executor and the typed contracts.
//!
//! Mutations hand back the raw envelope and leave the `status == 200` check
//! to the caller. Lookups that wrap a nested `data` body collapse anything
//! other than a fully typed value into `None`. Nothing here retries.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use workbench_interfaces::{
    AddColumnsPayload, ColumnDetail, Data, DatasetDetail, DatasetList, DatasetModel,
    DatasetModelList, Envelope, ExecCodePayload, ModelForm, ModelLookup, NullFillStrategy,
    RenameColumnPayload, TickerList, TrainJobDetailed, TrainingMetadata,
};

use crate::config::ClientConfig;
use crate::endpoints::Endpoint;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::executor::{HttpExecutor, Method, RequestExecutor};
use crate::session::InMemorySession;

/// Typed access to every backend capability
#[derive(Clone)]
pub struct WorkbenchClient {
    base_url: String,
    executor: Arc<dyn RequestExecutor>,
}

impl std::fmt::Debug for WorkbenchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkbenchClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn to_payload<P: Serialize + ?Sized>(payload: &P) -> WorkbenchResult<Value> {
    serde_json::to_value(payload)
        .map_err(|e| WorkbenchError::InvalidParameter(format!("payload is not serializable: {}", e)))
}

impl WorkbenchClient {
    /// Creates a client sending requests through `executor`
    pub fn new(base_url: impl Into<String>, executor: Arc<dyn RequestExecutor>) -> Self {
        Self {
            base_url: base_url.into(),
            executor,
        }
    }

    /// Creates an HTTP client from configuration, seeding the session token
    pub fn from_config(config: &ClientConfig) -> WorkbenchResult<Self> {
        config.validate()?;
        let session = match &config.auth_token {
            Some(token) => InMemorySession::with_token(token.clone()),
            None => InMemorySession::new(),
        };
        let executor = HttpExecutor::from_config(config, Arc::new(session))?;
        Ok(Self::new(config.api_url.clone(), Arc::new(executor)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves the endpoint first, so a bad identifier never reaches the network
    async fn call(
        &self,
        method: Method,
        endpoint: Endpoint<'_>,
        payload: Option<Value>,
    ) -> WorkbenchResult<Envelope<Value>> {
        let locator = endpoint.resolve(&self.base_url)?;
        Ok(self.executor.execute(method, &locator, payload).await)
    }

    #[instrument(skip(self))]
    pub async fn fetch_datasets(&self) -> WorkbenchResult<Envelope<DatasetList>> {
        Ok(self.call(Method::Get, Endpoint::ListDatasets, None).await?.decode())
    }

    #[instrument(skip(self))]
    pub async fn fetch_dataset(&self, dataset: &str) -> WorkbenchResult<Envelope<DatasetDetail>> {
        Ok(self
            .call(Method::Get, Endpoint::Dataset { dataset }, None)
            .await?
            .decode())
    }

    /// Runs user code against one column; `code` is sent verbatim
    #[instrument(skip(self, code), fields(code_length = code.len()))]
    pub async fn exec_python_on_dataset_col(
        &self,
        dataset: &str,
        column: &str,
        code: &str,
    ) -> WorkbenchResult<Envelope<Value>> {
        let payload = to_payload(&ExecCodePayload::for_column(code))?;
        self.call(Method::Post, Endpoint::ExecOnColumn { dataset, column }, Some(payload))
            .await
    }

    /// Runs user code against the whole dataset, then imputes nulls
    #[instrument(skip(self, code), fields(code_length = code.len()))]
    pub async fn exec_python_on_dataset(
        &self,
        dataset: &str,
        code: &str,
        null_fill_strategy: NullFillStrategy,
    ) -> WorkbenchResult<Envelope<Value>> {
        let payload = to_payload(&ExecCodePayload::for_dataset(code, null_fill_strategy))?;
        self.call(Method::Post, Endpoint::ExecOnDataset { dataset }, Some(payload))
            .await
    }

    #[instrument(skip(self, form), fields(model = %form.name))]
    pub async fn create_model(&self, dataset: &str, form: &ModelForm) -> WorkbenchResult<Envelope<Value>> {
        let payload = to_payload(form)?;
        self.call(Method::Post, Endpoint::CreateModel { dataset }, Some(payload))
            .await
    }

    #[instrument(skip(self, payload))]
    pub async fn add_columns_to_dataset(
        &self,
        dataset: &str,
        payload: &AddColumnsPayload,
    ) -> WorkbenchResult<Envelope<Value>> {
        let payload = to_payload(payload)?;
        self.call(Method::Post, Endpoint::AddColumns { dataset }, Some(payload))
            .await
    }

    #[instrument(skip(self))]
    pub async fn fetch_column(&self, dataset: &str, column: &str) -> WorkbenchResult<Envelope<ColumnDetail>> {
        Ok(self
            .call(Method::Get, Endpoint::Column { dataset, column }, None)
            .await?
            .decode())
    }

    #[instrument(skip(self))]
    pub async fn fetch_all_tickers(&self) -> WorkbenchResult<Envelope<TickerList>> {
        Ok(self.call(Method::Get, Endpoint::AllTickers, None).await?.decode())
    }

    #[instrument(skip(self))]
    pub async fn fetch_dataset_models(&self, dataset: &str) -> WorkbenchResult<Envelope<DatasetModelList>> {
        Ok(self
            .call(Method::Get, Endpoint::DatasetModels { dataset }, None)
            .await?
            .decode())
    }

    /// `None` when the backend reports no such model
    #[instrument(skip(self))]
    pub async fn fetch_model_by_name(&self, model: &str) -> WorkbenchResult<Option<DatasetModel>> {
        let env = self
            .call(Method::Get, Endpoint::ModelByName { model }, None)
            .await?
            .decode::<ModelLookup>();

        let found = env.into_res().and_then(|lookup| lookup.model);
        if found.is_none() {
            debug!("Model {} not found", model);
        }
        Ok(found)
    }

    /// Renames a column in place. Lookups by the old name miss afterwards.
    #[instrument(skip(self))]
    pub async fn rename_column_name(
        &self,
        dataset: &str,
        old_name: &str,
        new_name: &str,
    ) -> WorkbenchResult<Envelope<Value>> {
        if old_name.is_empty() {
            return Err(WorkbenchError::empty_identifier("old column name"));
        }
        if new_name.is_empty() {
            return Err(WorkbenchError::empty_identifier("new column name"));
        }
        let payload = to_payload(&RenameColumnPayload {
            old_col_name: old_name.to_string(),
            new_col_name: new_name.to_string(),
        })?;
        self.call(Method::Post, Endpoint::RenameColumn { dataset }, Some(payload))
            .await
    }

    /// Accepts any job form; [`TrainJobForm`](workbench_interfaces::TrainJobForm) is the usual one
    #[instrument(skip(self, form))]
    pub async fn create_train_job<P>(&self, model: &str, form: &P) -> WorkbenchResult<Envelope<Value>>
    where
        P: Serialize + Sync + ?Sized,
    {
        let payload = to_payload(form)?;
        self.call(Method::Post, Endpoint::CreateTrainJob { model }, Some(payload))
            .await
    }

    /// `None` when the response carries no `data`
    #[instrument(skip(self))]
    pub async fn fetch_all_training_metadata_for_model(
        &self,
        model: &str,
    ) -> WorkbenchResult<Option<Vec<TrainingMetadata>>> {
        let env = self
            .call(Method::Get, Endpoint::TrainingMetadata { model }, None)
            .await?
            .decode::<Data<Vec<TrainingMetadata>>>();
        Ok(env.into_res().map(|wrapped| wrapped.data))
    }

    #[instrument(skip(self))]
    pub async fn stop_train(&self, train_job_id: &str) -> WorkbenchResult<Envelope<Value>> {
        self.call(Method::Post, Endpoint::StopTrain { train_job_id }, None)
            .await
    }

    /// `None` when the response carries no `data`
    #[instrument(skip(self))]
    pub async fn fetch_trainjob_detailed(&self, train_job_id: &str) -> WorkbenchResult<Option<TrainJobDetailed>> {
        let env = self
            .call(Method::Get, Endpoint::TrainJobDetailed { train_job_id }, None)
            .await?
            .decode::<Data<TrainJobDetailed>>();
        Ok(env.into_res().map(|wrapped| wrapped.data))
    }

    /// Accepts any backtest form; [`BacktestForm`](workbench_interfaces::BacktestForm) is the usual one
    #[instrument(skip(self, body))]
    pub async fn run_backtest<P>(&self, train_job_id: &str, body: &P) -> WorkbenchResult<Envelope<Value>>
    where
        P: Serialize + Sync + ?Sized,
    {
        let payload = to_payload(body)?;
        self.call(Method::Post, Endpoint::CreateBacktest { train_job_id }, Some(payload))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedExecutor;
    use serde_json::json;

    fn scripted() -> (Arc<ScriptedExecutor>, WorkbenchClient) {
        let executor = Arc::new(ScriptedExecutor::new());
        let client = WorkbenchClient::new(ScriptedExecutor::BASE_URL, executor.clone());
        (executor, client)
    }

    #[tokio::test]
    async fn test_empty_identifier_fails_before_network() {
        let (executor, client) = scripted();

        let err = client.fetch_dataset("").await.unwrap_err();
        assert!(matches!(err, WorkbenchError::InvalidParameter(_)));

        assert!(client.stop_train("").await.is_err());
        assert!(client.rename_column_name("btc", "close", "").await.is_err());
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_code_is_sent_verbatim() {
        let (executor, client) = scripted();
        executor.push(Method::Post, "/dataset/btc/exec-python", Envelope::success(200, json!({})));

        let code = "dataset = get_dataset()\ndataset['x'] = dataset['y'] * 3  # \"quoted\"\n";
        let env = client
            .exec_python_on_dataset("btc", code, NullFillStrategy::Closest)
            .await
            .unwrap();

        assert!(env.is_ok());
        let call = &executor.calls()[0];
        assert_eq!(
            call.payload,
            Some(json!({"code": code, "null_fill_strategy": "CLOSEST"}))
        );
    }

    #[tokio::test]
    async fn test_model_lookup_absent_is_none() {
        let (executor, client) = scripted();
        executor.push(Method::Get, "/model/lin", Envelope::success(200, json!({"model": null})));

        assert_eq!(client.fetch_model_by_name("lin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_detail_lookup_failure_is_none() {
        let (executor, client) = scripted();
        executor.push(
            Method::Get,
            "/model/train/9/detailed",
            Envelope::failure(500, workbench_interfaces::FailureKind::Rejected, "boom"),
        );

        assert_eq!(client.fetch_trainjob_detailed("9").await.unwrap(), None);
    }
}
