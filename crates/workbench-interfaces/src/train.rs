//! Training job, epoch and backtest contracts

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::dataset::Dataset;
use crate::model::DatasetModel;

/// Accepts ids the backend sends either as integers or as strings
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// A single training run of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainJob {
    /// Opaque job id
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Backend row id of the trained model
    #[serde(default)]
    pub model_id: Option<i64>,

    /// Whether the backend still runs this job
    #[serde(default)]
    pub is_training: bool,

    /// Epochs finished so far
    #[serde(default)]
    pub epochs_ran: u32,

    /// Epochs requested
    #[serde(default)]
    pub num_epochs: u32,

    /// Whether weights are kept for every epoch
    #[serde(default)]
    pub save_model_every_epoch: bool,

    /// Whether a backtest runs on the validation set after each epoch
    #[serde(default)]
    pub backtest_on_validation_set: bool,
}

/// Metrics and weights captured after one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochInfo {
    /// Epoch index
    #[serde(alias = "epoch_nr")]
    pub epoch: u32,

    /// Training loss
    #[serde(default)]
    pub train_loss: Option<f64>,

    /// Validation loss
    #[serde(default)]
    pub val_loss: Option<f64>,

    /// Serialized weight snapshot
    #[serde(default)]
    pub weights: Option<Value>,

    /// Predictions on the validation set
    #[serde(default)]
    pub val_predictions: Option<Value>,
}

/// One entry of the per-model training metadata list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// The job
    pub train: TrainJob,
    /// Latest weights of the job
    pub weights: EpochInfo,
}

/// Everything needed to render a training job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainJobDetailed {
    /// Dataset the model was created on
    pub dataset: Dataset,
    /// Model as it was when the job was created
    pub model: DatasetModel,
    /// The job
    pub train_job: TrainJob,
    /// Epochs completed so far
    #[serde(default)]
    pub epochs: Vec<EpochInfo>,
}

/// Default create-train-job payload.
///
/// Unknown keys a caller adds are carried in `extra` and sent along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainJobForm {
    /// Epochs to run
    pub num_epochs: u32,
    /// Keep weights for every epoch
    pub save_model_after_every_epoch: bool,
    /// Backtest on the validation set after each epoch
    pub backtest_on_val_set: bool,
    /// Additional backend-specific fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrainJobForm {
    /// Form for `num_epochs` epochs with per-epoch saving enabled
    pub fn new(num_epochs: u32) -> Self {
        Self {
            num_epochs,
            save_model_after_every_epoch: true,
            backtest_on_val_set: false,
            extra: Map::new(),
        }
    }
}

/// Response body of create-train-job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainJobCreated {
    /// Id of the new job
    #[serde(alias = "train_job_id", deserialize_with = "id_from_string_or_number")]
    pub id: String,
}

/// Default run-backtest payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestForm {
    /// Epoch whose weights drive the simulation
    pub epoch_nr: u32,
    /// User-authored trade entry and exit code, sent verbatim
    pub enter_and_exit_criteria: String,
    /// Additional backend-specific fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BacktestForm {
    /// Backtest of `epoch_nr` using the given criteria code
    pub fn new(epoch_nr: u32, enter_and_exit_criteria: impl Into<String>) -> Self {
        Self {
            epoch_nr,
            enter_and_exit_criteria: enter_and_exit_criteria.into(),
            extra: Map::new(),
        }
    }
}

/// Result of a backtest simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backtest {
    /// Backend row id
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// Label given when the backtest was run
    #[serde(default)]
    pub name: Option<String>,
    /// Simulated account balance at the start
    #[serde(default)]
    pub start_balance: Option<f64>,
    /// Simulated account balance at the end
    #[serde(default)]
    pub end_balance: Option<f64>,
    /// Net result as a percentage of the start balance
    #[serde(default)]
    pub result_perc: Option<f64>,
    /// Gross profit divided by gross loss
    #[serde(default)]
    pub profit_factor: Option<f64>,
    /// Sum of all winning trades
    #[serde(default)]
    pub gross_profit: Option<f64>,
    /// Sum of all losing trades
    #[serde(default)]
    pub gross_loss: Option<f64>,
    /// Number of trades taken
    #[serde(default)]
    pub trade_count: Option<u64>,
    /// Percentage of trades that won
    #[serde(default)]
    pub share_of_winning_trades_perc: Option<f64>,
    /// Percentage of trades that lost
    #[serde(default)]
    pub share_of_losing_trades_perc: Option<f64>,
    /// Best single trade, in percent
    #[serde(default)]
    pub best_trade_result_perc: Option<f64>,
    /// Worst single trade, in percent
    #[serde(default)]
    pub worst_trade_result_perc: Option<f64>,
    /// Net result of holding over the same period
    #[serde(default)]
    pub buy_and_hold_result_net: Option<f64>,
    /// Buy and hold result, in percent
    #[serde(default)]
    pub buy_and_hold_result_perc: Option<f64>,
    /// Largest peak to trough drop, in percent
    #[serde(default)]
    pub max_drawdown_perc: Option<f64>,
}
