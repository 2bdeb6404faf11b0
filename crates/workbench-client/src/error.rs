//! Error types for the workbench client
//!
//! Only locally detectable problems are errors. Anything that happens on the
//! wire is reported inside an [`Envelope`](workbench_interfaces::Envelope).

use thiserror::Error;
use workbench_interfaces::ContractError;

/// Precondition failures raised before any network activity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkbenchError {
    /// A required identifier is empty or a value is outside its contract
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The operation needs a training job and none has been created yet
    #[error("No train job exists yet")]
    NoTrainJob,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl WorkbenchError {
    /// Helper for an empty required identifier
    pub fn empty_identifier(name: &str) -> Self {
        WorkbenchError::InvalidParameter(format!("{} must not be empty", name))
    }
}

impl From<ContractError> for WorkbenchError {
    fn from(error: ContractError) -> Self {
        match error {
            ContractError::InvalidParameter(msg) => WorkbenchError::InvalidParameter(msg),
        }
    }
}

/// Result type for workbench client operations
pub type WorkbenchResult<T> = Result<T, WorkbenchError>;
