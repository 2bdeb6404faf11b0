//! Training lifecycle
//!
//! Tracks one training job of one model from configuration to backtest and
//! decides which operations are legal along the way. Backtests run alongside
//! the training phase, so the state is kept as two phases and combined into a
//! [`JobState`] on read.
//!
//! Concurrent `create_train_job` calls are not serialized. Each one completes
//! independently and the last successful response to land becomes the tracked
//! job.

mod completion;
mod epochs;
mod state;

pub use completion::CompletionPolicy;
pub use epochs::EpochLog;
pub use state::{BacktestPhase, JobState, TrainPhase};

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use workbench_interfaces::{Backtest, Data, EpochInfo, Envelope, TrainJobCreated, TrainJobDetailed};

use crate::bus::REFETCH_COMPONENT;
use crate::cache::QueryKey;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::paths;
use crate::signals::{BackendSignal, EpochProgress};
use crate::workbench::{MutationOutcome, Workbench};
use completion::CompletionTracker;

/// Result of a stop request
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// The request went out; check the envelope for the backend's answer
    Sent(Envelope<Value>),
    /// Nothing to stop in this phase, no request was made
    Skipped(TrainPhase),
}

/// Result of a backtest request
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOutcome {
    pub envelope: Envelope<Value>,
    /// The job was still running when the backtest was requested
    pub still_training: bool,
}

#[derive(Debug)]
struct LifecycleInner {
    train_job_id: Option<String>,
    phase: TrainPhase,
    backtest: BacktestPhase,
    backtests_in_flight: usize,
    epochs: EpochLog,
    tracker: CompletionTracker,
    last_progress: Option<EpochProgress>,
}

impl LifecycleInner {
    fn tracks(&self, train_job_id: &str) -> bool {
        self.train_job_id.as_deref() == Some(train_job_id)
    }

    /// Moves forward if allowed; returns whether the phase changed
    fn advance(&mut self, next: TrainPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            return false;
        }
        debug!(from = %self.phase, to = %next, "Train phase changed");
        self.phase = next;
        true
    }

    fn begin_backtest(&mut self) {
        self.backtests_in_flight += 1;
        if !matches!(self.backtest, BacktestPhase::Available(_)) {
            self.backtest = BacktestPhase::Requested;
        }
    }

    /// Settles one backtest request; a failure never replaces a result
    fn finish_backtest(&mut self, result: Option<Option<Backtest>>) {
        self.backtests_in_flight = self.backtests_in_flight.saturating_sub(1);
        match result {
            Some(backtest) => self.backtest = BacktestPhase::Available(backtest),
            None => {
                if self.backtest == BacktestPhase::Requested && self.backtests_in_flight == 0 {
                    self.backtest = BacktestPhase::NotRequested;
                }
            }
        }
    }

    /// Starts tracking a new job from scratch
    fn track(&mut self, train_job_id: String) {
        self.train_job_id = Some(train_job_id);
        self.phase = TrainPhase::Created;
        self.backtest = BacktestPhase::NotRequested;
        self.backtests_in_flight = 0;
        self.epochs.clear();
        self.tracker.reset();
        self.last_progress = None;
    }
}

fn decode_backtest(res: &Value) -> Option<Backtest> {
    serde_json::from_value::<Data<Backtest>>(res.clone())
        .map(|wrapped| wrapped.data)
        .ok()
}

/// Orchestrates the training of one model
#[derive(Debug)]
pub struct TrainingLifecycle {
    workbench: Workbench,
    dataset: String,
    model: String,
    inner: Mutex<LifecycleInner>,
}

impl TrainingLifecycle {
    pub(crate) fn new(
        workbench: Workbench,
        dataset: &str,
        model: &str,
        train_job_id: Option<String>,
    ) -> WorkbenchResult<Self> {
        if dataset.is_empty() {
            return Err(WorkbenchError::empty_identifier("dataset name"));
        }
        if model.is_empty() {
            return Err(WorkbenchError::empty_identifier("model name"));
        }

        let mut inner = LifecycleInner {
            train_job_id: None,
            phase: TrainPhase::Configuring,
            backtest: BacktestPhase::NotRequested,
            backtests_in_flight: 0,
            epochs: EpochLog::new(),
            tracker: CompletionTracker::default(),
            last_progress: None,
        };
        if let Some(id) = train_job_id {
            inner.track(id);
        }

        Ok(Self {
            workbench,
            dataset: dataset.to_string(),
            model: model.to_string(),
            inner: Mutex::new(inner),
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn state(&self) -> JobState {
        let inner = self.inner.lock();
        JobState::from_phases(inner.phase, &inner.backtest)
    }

    pub fn phase(&self) -> TrainPhase {
        self.inner.lock().phase
    }

    pub fn backtest_phase(&self) -> BacktestPhase {
        self.inner.lock().backtest.clone()
    }

    pub fn train_job_id(&self) -> Option<String> {
        self.inner.lock().train_job_id.clone()
    }

    /// Epochs seen so far, ordered by index
    pub fn epochs(&self) -> Vec<EpochInfo> {
        self.inner.lock().epochs.to_vec()
    }

    /// Latest progress pushed by the backend for the tracked job
    pub fn last_progress(&self) -> Option<EpochProgress> {
        self.inner.lock().last_progress.clone()
    }

    fn require_job_id(&self) -> WorkbenchResult<String> {
        self.train_job_id().ok_or(WorkbenchError::NoTrainJob)
    }

    /// Launches a training run.
    ///
    /// On success the new job replaces whatever job was tracked before and the
    /// outcome points at the job's page.
    #[instrument(skip(self, form), fields(model = %self.model))]
    pub async fn create_train_job<P>(&self, form: &P) -> WorkbenchResult<MutationOutcome>
    where
        P: Serialize + Sync + ?Sized,
    {
        let envelope = self.workbench.client().create_train_job(&self.model, form).await?;
        if !envelope.is_ok() {
            warn!(status = envelope.status(), error = ?envelope.error(), "Train job creation rejected");
            return Ok(MutationOutcome::without_navigation(envelope));
        }

        let created = envelope
            .res()
            .and_then(|res| serde_json::from_value::<TrainJobCreated>(res.clone()).ok());
        let Some(TrainJobCreated { id }) = created else {
            warn!("Train job created but the response carried no job id");
            return Ok(MutationOutcome::without_navigation(envelope));
        };

        {
            let mut inner = self.inner.lock();
            if let Some(previous) = inner.train_job_id.as_deref() {
                if previous != id {
                    info!(previous, current = %id, "Tracking newer train job");
                }
            }
            inner.track(id.clone());
        }

        self.workbench
            .cache()
            .invalidate(&QueryKey::TrainingMetadata(self.model.clone()));
        self.workbench.bus().publish(REFETCH_COMPONENT);

        Ok(MutationOutcome {
            envelope,
            navigate_to: paths::train_job_path(&self.dataset, &self.model, &id).ok(),
        })
    }

    /// Reloads job detail through the cache and applies it.
    ///
    /// Returns `None` when the backend had no detail to give.
    #[instrument(skip(self), fields(model = %self.model))]
    pub async fn refresh(&self) -> WorkbenchResult<Option<TrainJobDetailed>> {
        let id = self.require_job_id()?;
        let resource = self
            .workbench
            .cache()
            .refetch(&QueryKey::TrainJob(id.clone()))
            .await?;

        let Some(detail) = resource.as_train_job() else {
            debug!(train_job_id = %id, "No detail for train job");
            return Ok(None);
        };

        if self.apply_detail(&id, detail) {
            self.workbench.bus().publish(REFETCH_COMPONENT);
        }
        Ok(Some(detail.clone()))
    }

    /// Merges epochs and moves the phase; returns whether the phase changed
    fn apply_detail(&self, id: &str, detail: &TrainJobDetailed) -> bool {
        let policy = self.workbench.policy();
        let mut inner = self.inner.lock();
        if !inner.tracks(id) {
            debug!(train_job_id = %id, "Ignoring detail of a job no longer tracked");
            return false;
        }

        inner.epochs.merge(detail.epochs.iter().cloned());
        let epoch_count = inner.epochs.len();
        let completed = inner.tracker.observe(&policy, &detail.train_job, epoch_count);

        let mut changed = false;
        if detail.train_job.is_training {
            changed |= inner.advance(TrainPhase::Training);
        }
        if completed && inner.advance(TrainPhase::Completed) {
            info!(train_job_id = %id, epochs = epoch_count, "Train job completed");
            changed = true;
        }
        changed
    }

    /// Stops the run unless the job already reached a terminal state.
    ///
    /// An available backtest counts as terminal.
    #[instrument(skip(self), fields(model = %self.model))]
    pub async fn stop(&self) -> WorkbenchResult<StopOutcome> {
        let (id, phase, terminal) = {
            let inner = self.inner.lock();
            let state = JobState::from_phases(inner.phase, &inner.backtest);
            (inner.train_job_id.clone(), inner.phase, state.is_terminal())
        };
        let id = match id {
            Some(id) if !terminal => id,
            _ => {
                debug!(%phase, "Stop ignored");
                return Ok(StopOutcome::Skipped(phase));
            }
        };

        let envelope = self.workbench.client().stop_train(&id).await?;
        if !envelope.is_ok() {
            warn!(status = envelope.status(), error = ?envelope.error(), "Stop rejected");
            return Ok(StopOutcome::Sent(envelope));
        }

        {
            let mut inner = self.inner.lock();
            if inner.tracks(&id) {
                inner.advance(TrainPhase::Stopped);
            }
        }
        self.workbench.cache().invalidate(&QueryKey::TrainJob(id));
        self.workbench.bus().publish(REFETCH_COMPONENT);

        Ok(StopOutcome::Sent(envelope))
    }

    /// Requests a backtest of the tracked job.
    ///
    /// Allowed as soon as a job exists; `still_training` tells the caller to
    /// warn the user.
    #[instrument(skip(self, form), fields(model = %self.model))]
    pub async fn run_backtest<P>(&self, form: &P) -> WorkbenchResult<BacktestOutcome>
    where
        P: Serialize + Sync + ?Sized,
    {
        let (id, phase) = {
            let mut inner = self.inner.lock();
            let id = inner.train_job_id.clone().ok_or(WorkbenchError::NoTrainJob)?;
            inner.begin_backtest();
            (id, inner.phase)
        };

        let still_training = phase.is_active();
        if still_training {
            warn!(train_job_id = %id, "Backtest requested while the job is still training");
        }

        let result = self.workbench.client().run_backtest(&id, form).await;

        let mut inner = self.inner.lock();
        let envelope = match result {
            Ok(envelope) => envelope,
            Err(e) => {
                if inner.tracks(&id) {
                    inner.finish_backtest(None);
                }
                return Err(e);
            }
        };

        if !envelope.is_ok() {
            warn!(status = envelope.status(), error = ?envelope.error(), "Backtest rejected");
        }
        if inner.tracks(&id) {
            let result = envelope
                .is_ok()
                .then(|| envelope.res().and_then(decode_backtest));
            inner.finish_backtest(result);
        }
        drop(inner);

        if envelope.is_ok() {
            self.workbench.bus().publish(REFETCH_COMPONENT);
        }
        Ok(BacktestOutcome {
            envelope,
            still_training,
        })
    }

    /// Applies a pushed signal; returns whether it concerned the tracked job.
    ///
    /// Epoch signals only record progress. Completion is left to [`refresh`](Self::refresh).
    pub fn ingest_signal(&self, signal: &BackendSignal) -> bool {
        let BackendSignal::EpochComplete(progress) = signal else {
            return false;
        };

        let mut inner = self.inner.lock();
        if !inner.tracks(&progress.train_job_id) {
            return false;
        }
        inner.advance(TrainPhase::Training);
        if progress.is_final_epoch() {
            debug!(train_job_id = %progress.train_job_id, "Final epoch reported");
        }
        inner.last_progress = Some(progress.clone());
        true
    }

    /// Refreshes every `interval` until the run ends or a refresh cannot be issued
    pub fn watch(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let lifecycle = Arc::clone(self);
        let period = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if lifecycle.phase().is_terminal() {
                    break;
                }
                if let Err(e) = lifecycle.refresh().await {
                    warn!(model = %lifecycle.model, "Stopped watching train job: {}", e);
                    break;
                }
            }
            debug!(model = %lifecycle.model, phase = %lifecycle.phase(), "Watch finished");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Method;
    use crate::operations::WorkbenchClient;
    use crate::test_utils::ScriptedExecutor;
    use serde_json::json;
    use workbench_interfaces::{BacktestForm, TrainJobForm};

    fn setup() -> (Arc<ScriptedExecutor>, Workbench) {
        let executor = Arc::new(ScriptedExecutor::new());
        let client = WorkbenchClient::new(ScriptedExecutor::BASE_URL, executor.clone());
        let wb = Workbench::new(Arc::new(client)).with_policy(CompletionPolicy { stable_polls: 1 });
        (executor, wb)
    }

    fn detail(id: &str, is_training: bool, epochs_ran: u32, epochs: &[u32]) -> Value {
        json!({"data": {
            "dataset": {"dataset_name": "btc", "columns": ["close"], "timeseries_col": "kline_open_time", "price_column": "close", "id": 1},
            "model": {"model_name": "lin", "model_code": "", "hyper_params_and_optimizer_code": "", "id": 2, "dataset_id": 1},
            "train_job": {"id": id, "is_training": is_training, "epochs_ran": epochs_ran, "num_epochs": 5},
            "epochs": epochs.iter().map(|e| json!({"epoch": e, "train_loss": 0.1})).collect::<Vec<_>>()
        }})
    }

    #[tokio::test]
    async fn test_create_moves_to_created() {
        let (executor, wb) = setup();
        executor.push(Method::Post, "/model/lin/create-train", Envelope::success(200, json!({"id": 7})));
        let lifecycle = wb.training("btc", "lin").unwrap();
        assert_eq!(lifecycle.state(), JobState::Configuring);

        let outcome = lifecycle.create_train_job(&TrainJobForm::new(5)).await.unwrap();

        assert_eq!(lifecycle.state(), JobState::Created);
        assert_eq!(lifecycle.train_job_id().as_deref(), Some("7"));
        assert_eq!(
            outcome.navigate_to.as_deref(),
            Some("/data/datasets/btc/models/lin/trainjobs/7")
        );
    }

    #[tokio::test]
    async fn test_rejected_create_stays_configuring() {
        let (executor, wb) = setup();
        executor.push(
            Method::Post,
            "/model/lin/create-train",
            Envelope::failure(409, workbench_interfaces::FailureKind::Rejected, "busy"),
        );
        let lifecycle = wb.training("btc", "lin").unwrap();

        let outcome = lifecycle.create_train_job(&TrainJobForm::new(5)).await.unwrap();

        assert!(!outcome.is_ok());
        assert_eq!(lifecycle.state(), JobState::Configuring);
    }

    #[tokio::test]
    async fn test_stop_without_job_is_skipped() {
        let (executor, wb) = setup();
        let lifecycle = wb.training("btc", "lin").unwrap();

        let outcome = lifecycle.stop().await.unwrap();

        assert_eq!(outcome, StopOutcome::Skipped(TrainPhase::Configuring));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_after_completion_is_skipped() {
        let (executor, wb) = setup();
        executor.push(Method::Get, "/model/train/7/detailed", Envelope::success(200, detail("7", false, 5, &[1, 2, 3, 4, 5])));
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        lifecycle.refresh().await.unwrap();
        assert_eq!(lifecycle.phase(), TrainPhase::Completed);

        let outcome = lifecycle.stop().await.unwrap();
        assert_eq!(outcome, StopOutcome::Skipped(TrainPhase::Completed));
        assert_eq!(executor.call_count(Method::Post, "/model/train/7/stop"), 0);
    }

    #[tokio::test]
    async fn test_refresh_merges_epochs_and_never_leaves_terminal() {
        let (executor, wb) = setup();
        executor.push(Method::Post, "/model/train/7/stop", Envelope::success(200, json!({})));
        executor.push(Method::Get, "/model/train/7/detailed", Envelope::success(200, detail("7", true, 2, &[2, 1])));
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        lifecycle.refresh().await.unwrap();
        assert_eq!(lifecycle.phase(), TrainPhase::Training);
        let order: Vec<u32> = lifecycle.epochs().iter().map(|e| e.epoch).collect();
        assert_eq!(order, vec![1, 2]);

        assert!(matches!(lifecycle.stop().await.unwrap(), StopOutcome::Sent(_)));
        assert_eq!(lifecycle.phase(), TrainPhase::Stopped);

        // Backend still says training; the stop is not undone
        lifecycle.refresh().await.unwrap();
        assert_eq!(lifecycle.phase(), TrainPhase::Stopped);
    }

    #[tokio::test]
    async fn test_backtest_requires_job() {
        let (_executor, wb) = setup();
        let lifecycle = wb.training("btc", "lin").unwrap();

        let err = lifecycle
            .run_backtest(&BacktestForm::new(1, "enter = True"))
            .await
            .unwrap_err();

        assert_eq!(err, WorkbenchError::NoTrainJob);
    }

    #[tokio::test]
    async fn test_backtest_while_training_is_allowed() {
        let (executor, wb) = setup();
        executor.push(
            Method::Post,
            "/model/train/7/backtest",
            Envelope::success(200, json!({"data": {"id": 3, "end_balance": 11000.0}})),
        );
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        let outcome = lifecycle
            .run_backtest(&BacktestForm::new(1, "enter = True"))
            .await
            .unwrap();

        assert!(outcome.still_training);
        assert_eq!(lifecycle.state(), JobState::BacktestAvailable);
        match lifecycle.backtest_phase() {
            BacktestPhase::Available(Some(bt)) => assert_eq!(bt.end_balance, Some(11000.0)),
            other => panic!("unexpected backtest phase {:?}", other),
        }
        // Training itself is unaffected
        assert_eq!(lifecycle.phase(), TrainPhase::Created);
    }

    #[tokio::test]
    async fn test_rejected_backtest_restores_phase() {
        let (executor, wb) = setup();
        executor.push(
            Method::Post,
            "/model/train/7/backtest",
            Envelope::failure(500, workbench_interfaces::FailureKind::Rejected, "no weights"),
        );
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        let outcome = lifecycle.run_backtest(&json!({"epoch_nr": 1})).await.unwrap();

        assert!(!outcome.envelope.is_ok());
        assert_eq!(lifecycle.backtest_phase(), BacktestPhase::NotRequested);
    }

    fn backtest_ok(id: u32) -> Envelope<Value> {
        Envelope::success(200, json!({"data": {"id": id, "end_balance": 10500.0}}))
    }

    fn backtest_failed() -> Envelope<Value> {
        Envelope::failure(500, workbench_interfaces::FailureKind::Rejected, "no weights")
    }

    #[tokio::test]
    async fn test_slow_failure_keeps_earlier_backtest() {
        let (executor, wb) = setup();
        let route = "/model/train/7/backtest";
        executor.push_delayed(Method::Post, route, Duration::from_millis(120), backtest_failed());
        executor.push_delayed(Method::Post, route, Duration::from_millis(10), backtest_ok(3));
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        let form = BacktestForm::new(1, "enter = True");
        let (slow, fast) = tokio::join!(lifecycle.run_backtest(&form), lifecycle.run_backtest(&form));

        assert!(!slow.unwrap().envelope.is_ok());
        assert!(fast.unwrap().envelope.is_ok());
        assert_eq!(lifecycle.state(), JobState::BacktestAvailable);
        match lifecycle.backtest_phase() {
            BacktestPhase::Available(Some(bt)) => assert_eq!(bt.id, "3"),
            other => panic!("unexpected backtest phase {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fast_failure_waits_for_pending_backtest() {
        let (executor, wb) = setup();
        let route = "/model/train/7/backtest";
        executor.push_delayed(Method::Post, route, Duration::from_millis(120), backtest_ok(4));
        executor.push_delayed(Method::Post, route, Duration::from_millis(10), backtest_failed());
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        let form = BacktestForm::new(1, "enter = True");
        let observer = Arc::clone(&lifecycle);
        let (_slow, _fast, midway) = tokio::join!(
            lifecycle.run_backtest(&form),
            lifecycle.run_backtest(&form),
            async move {
                tokio::time::sleep(Duration::from_millis(60)).await;
                observer.backtest_phase()
            }
        );

        // One request still pending after the failure landed
        assert_eq!(midway, BacktestPhase::Requested);
        assert_eq!(lifecycle.state(), JobState::BacktestAvailable);
        assert_eq!(executor.call_count(Method::Post, route), 2);
    }

    #[tokio::test]
    async fn test_all_backtests_failing_returns_to_not_requested() {
        let (executor, wb) = setup();
        executor.push(Method::Post, "/model/train/7/backtest", backtest_failed());
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        let form = BacktestForm::new(1, "enter = True");
        let _ = tokio::join!(lifecycle.run_backtest(&form), lifecycle.run_backtest(&form));

        assert_eq!(lifecycle.backtest_phase(), BacktestPhase::NotRequested);
        assert_eq!(lifecycle.state(), JobState::Created);
    }

    #[tokio::test]
    async fn test_stop_after_backtest_is_skipped() {
        let (executor, wb) = setup();
        executor.push(Method::Post, "/model/train/7/backtest", backtest_ok(3));
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        lifecycle.run_backtest(&BacktestForm::new(1, "enter = True")).await.unwrap();
        assert!(lifecycle.state().is_terminal());

        let outcome = lifecycle.stop().await.unwrap();

        assert_eq!(outcome, StopOutcome::Skipped(TrainPhase::Created));
        assert_eq!(executor.call_count(Method::Post, "/model/train/7/stop"), 0);
        assert_eq!(lifecycle.state(), JobState::BacktestAvailable);
    }

    #[tokio::test]
    async fn test_signals_for_other_jobs_are_ignored() {
        let (_executor, wb) = setup();
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        let other = BackendSignal::parse("SIGNAL_EPOCH_COMPLETE\n1/5/0.5/0.6/1.0/8").unwrap();
        let own = BackendSignal::parse("SIGNAL_EPOCH_COMPLETE\n1/5/0.5/0.6/1.0/7").unwrap();

        assert!(!lifecycle.ingest_signal(&other));
        assert!(!lifecycle.ingest_signal(&BackendSignal::CloseToolbar));
        assert!(lifecycle.ingest_signal(&own));
        assert_eq!(lifecycle.phase(), TrainPhase::Training);
        assert_eq!(lifecycle.last_progress().map(|p| p.epochs_ran), Some(1));
    }

    #[tokio::test]
    async fn test_watch_ends_on_completion() {
        let (executor, wb) = setup();
        executor.push(Method::Get, "/model/train/7/detailed", Envelope::success(200, detail("7", true, 1, &[1])));
        executor.push(Method::Get, "/model/train/7/detailed", Envelope::success(200, detail("7", false, 5, &[1, 2, 3, 4, 5])));
        let lifecycle = wb.attach_training("btc", "lin", "7").unwrap();

        let handle = lifecycle.watch(Duration::from_millis(5));
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("watch did not finish")
            .unwrap();

        assert_eq!(lifecycle.phase(), TrainPhase::Completed);
        assert_eq!(lifecycle.epochs().len(), 5);
    }
}
