//! Workbench Interfaces
//!
//! This crate provides the typed contracts spoken between the workbench client
//! and the remote compute backend: response bodies, request payloads and the
//! uniform [`Envelope`] every operation returns.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Dataset and column shapes
pub mod dataset;

/// Uniform response envelope
pub mod envelope;

/// Model definitions, strategies and the create-model form
pub mod model;

/// Training jobs, epochs and backtests
pub mod train;

use thiserror::Error;

/// Errors raised while building a contract value locally
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// A value does not satisfy the contract (unknown enum text, bad range, ...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for contract construction
pub type ContractResult<T> = Result<T, ContractError>;

/// Re-export key types for convenient usage
pub use dataset::{
    AddColumnsPayload, Column, ColumnDetail, ColumnStats, Dataset, DatasetDetail, DatasetList,
    DatasetSummary, ExecCodePayload, RenameColumnPayload, Ticker, TickerList,
};
pub use envelope::{Data, Envelope, FailureKind, NO_STATUS};
pub use model::{
    DatasetModel, DatasetModelList, ModelForm, ModelLookup, NullFillStrategy, ScalingStrategy,
    ValidationSplit,
};
pub use train::{
    Backtest, BacktestForm, EpochInfo, TrainJob, TrainJobCreated,
    TrainJobDetailed, TrainJobForm, TrainingMetadata,
};
