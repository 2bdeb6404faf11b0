use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use workbench_client::interfaces::{BacktestForm, Envelope, ModelForm, TrainJobForm, ValidationSplit};
use workbench_client::test_utils::ScriptedExecutor;
use workbench_client::{
    BackendSignal, BacktestPhase, CompletionPolicy, HttpExecutor, InMemorySession, JobState, Method,
    StopOutcome, TrainPhase, Workbench, WorkbenchClient, WorkbenchError,
};

#[tokio::test]
async fn test_concurrent_creates_both_complete_and_last_landing_wins() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push_delayed(
        Method::Post,
        "/model/lin/create-train",
        Duration::from_millis(120),
        Envelope::success(200, json!({"id": 1})),
    );
    executor.push_delayed(
        Method::Post,
        "/model/lin/create-train",
        Duration::from_millis(10),
        Envelope::success(200, json!({"id": 2})),
    );
    let client = WorkbenchClient::new(ScriptedExecutor::BASE_URL, executor.clone());
    let wb = Workbench::new(Arc::new(client));
    let lifecycle = wb.training("btc", "lin").unwrap();

    let form = TrainJobForm::new(10);
    let (first, second) = tokio::join!(
        lifecycle.create_train_job(&form),
        lifecycle.create_train_job(&form)
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(
        first.navigate_to.as_deref(),
        Some("/data/datasets/btc/models/lin/trainjobs/1")
    );
    assert_eq!(
        second.navigate_to.as_deref(),
        Some("/data/datasets/btc/models/lin/trainjobs/2")
    );
    assert_eq!(executor.call_count(Method::Post, "/model/lin/create-train"), 2);

    // Job 1 answered last, so it is the one tracked
    assert_eq!(lifecycle.train_job_id().as_deref(), Some("1"));
    assert_eq!(lifecycle.state(), JobState::Created);
}

#[tokio::test]
async fn test_operations_require_a_job() {
    let executor = Arc::new(ScriptedExecutor::new());
    let client = WorkbenchClient::new(ScriptedExecutor::BASE_URL, executor.clone());
    let wb = Workbench::new(Arc::new(client));
    let lifecycle = wb.training("btc", "lin").unwrap();

    assert_eq!(lifecycle.refresh().await.unwrap_err(), WorkbenchError::NoTrainJob);
    assert_eq!(
        lifecycle.run_backtest(&BacktestForm::new(1, "")).await.unwrap_err(),
        WorkbenchError::NoTrainJob
    );
    assert_eq!(
        lifecycle.stop().await.unwrap(),
        StopOutcome::Skipped(TrainPhase::Configuring)
    );
    assert!(executor.calls().is_empty());

    assert!(wb.training("", "lin").is_err());
    assert!(wb.attach_training("btc", "lin", "").is_err());
}

fn detail_body(is_training: bool, epochs_ran: u32) -> serde_json::Value {
    let epochs: Vec<_> = (1..=epochs_ran)
        .map(|e| json!({"epoch": e, "train_loss": 1.0 / e as f64, "val_loss": 1.5 / e as f64}))
        .collect();
    json!({"data": {
        "dataset": {"dataset_name": "btc_1h", "columns": ["close"], "timeseries_col": "kline_open_time"},
        "model": {"model_name": "lin", "target_col": "close", "validation_split": [80, 100]},
        "train_job": {"id": 11, "is_training": is_training, "epochs_ran": epochs_ran, "num_epochs": 3},
        "epochs": epochs
    }})
}

#[tokio::test]
async fn test_full_flow_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dataset/btc_1h/models/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/model/lin/create-train"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 11})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/model/train/11/detailed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_body(true, 1)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/model/train/11/detailed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_body(false, 3)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/model/train/11/backtest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {
            "id": 4, "start_balance": 10000.0, "end_balance": 12500.0, "trade_count": 17
        }})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/model/train/11/stop"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let executor = HttpExecutor::new(Duration::from_secs(5), Arc::new(InMemorySession::with_token("t"))).unwrap();
    let client = WorkbenchClient::new(server.uri(), Arc::new(executor));
    let wb = Workbench::new(Arc::new(client)).with_policy(CompletionPolicy { stable_polls: 2 });

    let form = ModelForm::new("lin", "close")
        .with_code("model = Linear()", "optimizer = Adam()")
        .with_validation_split(ValidationSplit::new(80, 100).unwrap());
    let created = wb.create_model("btc_1h", &form).await.unwrap();
    assert_eq!(created.navigate_to.as_deref(), Some("/data/datasets/btc_1h/models/lin"));

    let lifecycle = wb.training("btc_1h", "lin").unwrap();
    lifecycle.create_train_job(&TrainJobForm::new(3)).await.unwrap();
    assert_eq!(lifecycle.state(), JobState::Created);

    lifecycle.refresh().await.unwrap();
    assert_eq!(lifecycle.state(), JobState::Training);

    let signal = BackendSignal::parse("SIGNAL_EPOCH_COMPLETE\n2/3/0.5/0.75/0.8/11").unwrap();
    assert!(lifecycle.ingest_signal(&signal));

    lifecycle.refresh().await.unwrap();
    assert_eq!(lifecycle.state(), JobState::Completed);
    let epochs: Vec<u32> = lifecycle.epochs().iter().map(|e| e.epoch).collect();
    assert_eq!(epochs, vec![1, 2, 3]);

    // Already terminal, so no request is sent
    assert_eq!(
        lifecycle.stop().await.unwrap(),
        StopOutcome::Skipped(TrainPhase::Completed)
    );

    let outcome = lifecycle
        .run_backtest(&BacktestForm::new(3, "enter = pred > price"))
        .await
        .unwrap();
    assert!(!outcome.still_training);
    assert_eq!(lifecycle.state(), JobState::BacktestAvailable);
    match lifecycle.backtest_phase() {
        BacktestPhase::Available(Some(bt)) => {
            assert_eq!(bt.id, "4");
            assert_eq!(bt.trade_count, Some(17));
        }
        other => panic!("unexpected backtest phase {:?}", other),
    }
    assert_eq!(lifecycle.phase(), TrainPhase::Completed);
}
