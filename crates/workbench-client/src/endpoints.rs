//! Endpoint resolver
//!
//! Maps a logical operation and its identifiers to a concrete locator. Pure: no
//! I/O and no state. Every user-supplied identifier is percent-encoded, so
//! decoding a path segment always yields the identifier that went in.

use std::borrow::Cow;

use crate::error::{WorkbenchError, WorkbenchResult};

/// Every backend capability that has a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    ListDatasets,
    Dataset { dataset: &'a str },
    ExecOnColumn { dataset: &'a str, column: &'a str },
    ExecOnDataset { dataset: &'a str },
    CreateModel { dataset: &'a str },
    AddColumns { dataset: &'a str },
    Column { dataset: &'a str, column: &'a str },
    AllTickers,
    DatasetModels { dataset: &'a str },
    ModelByName { model: &'a str },
    RenameColumn { dataset: &'a str },
    CreateTrainJob { model: &'a str },
    TrainingMetadata { model: &'a str },
    StopTrain { train_job_id: &'a str },
    TrainJobDetailed { train_job_id: &'a str },
    CreateBacktest { train_job_id: &'a str },
}

/// Percent-encodes one path segment, rejecting empty identifiers
pub(crate) fn segment<'s>(name: &str, value: &'s str) -> WorkbenchResult<Cow<'s, str>> {
    if value.is_empty() {
        return Err(WorkbenchError::empty_identifier(name));
    }
    Ok(urlencoding::encode(value))
}

impl<'a> Endpoint<'a> {
    /// Path below the base URL
    pub fn path(&self) -> WorkbenchResult<String> {
        let path = match *self {
            Endpoint::ListDatasets => "/dataset/tables".to_string(),
            Endpoint::Dataset { dataset } => {
                format!("/dataset/{}", segment("dataset name", dataset)?)
            }
            Endpoint::ExecOnColumn { dataset, column } => format!(
                "/dataset/{}/exec-python/{}",
                segment("dataset name", dataset)?,
                segment("column name", column)?
            ),
            Endpoint::ExecOnDataset { dataset } => {
                format!("/dataset/{}/exec-python", segment("dataset name", dataset)?)
            }
            Endpoint::CreateModel { dataset } => {
                format!("/dataset/{}/models/create", segment("dataset name", dataset)?)
            }
            Endpoint::AddColumns { dataset } => {
                format!("/dataset/{}/add-columns", segment("dataset name", dataset)?)
            }
            Endpoint::Column { dataset, column } => format!(
                "/dataset/{}/col-info/{}",
                segment("dataset name", dataset)?,
                segment("column name", column)?
            ),
            Endpoint::AllTickers => "/binance/get-all-tickers".to_string(),
            Endpoint::DatasetModels { dataset } => {
                format!("/dataset/{}/models", segment("dataset name", dataset)?)
            }
            Endpoint::ModelByName { model } => {
                format!("/model/{}", segment("model name", model)?)
            }
            Endpoint::RenameColumn { dataset } => {
                format!("/dataset/{}/rename-column", segment("dataset name", dataset)?)
            }
            Endpoint::CreateTrainJob { model } => {
                format!("/model/{}/create-train", segment("model name", model)?)
            }
            Endpoint::TrainingMetadata { model } => {
                format!("/model/{}/trains", segment("model name", model)?)
            }
            Endpoint::StopTrain { train_job_id } => {
                format!("/model/train/{}/stop", segment("train job id", train_job_id)?)
            }
            Endpoint::TrainJobDetailed { train_job_id } => {
                format!("/model/train/{}/detailed", segment("train job id", train_job_id)?)
            }
            Endpoint::CreateBacktest { train_job_id } => {
                format!("/model/train/{}/backtest", segment("train job id", train_job_id)?)
            }
        };
        Ok(path)
    }

    /// Full locator under `base_url`
    pub fn resolve(&self, base_url: &str) -> WorkbenchResult<String> {
        Ok(format!("{}{}", base_url.trim_end_matches('/'), self.path()?))
    }
}
