//! Model contracts and the create-model form

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ContractError, ContractResult};

/// How missing values are imputed before a dataset is used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NullFillStrategy {
    /// Leave nulls in place
    #[default]
    None,
    /// Replace nulls with zero
    Zero,
    /// Replace nulls with the column mean
    Mean,
    /// Replace nulls with the closest known value
    Closest,
}

impl NullFillStrategy {
    /// Every strategy the backend supports
    pub const ALL: [NullFillStrategy; 4] = [
        NullFillStrategy::None,
        NullFillStrategy::Zero,
        NullFillStrategy::Mean,
        NullFillStrategy::Closest,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NullFillStrategy::None => "NONE",
            NullFillStrategy::Zero => "ZERO",
            NullFillStrategy::Mean => "MEAN",
            NullFillStrategy::Closest => "CLOSEST",
        }
    }
}

impl Display for NullFillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NullFillStrategy {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ContractError::InvalidParameter(format!("unknown null fill strategy '{}'", s)))
    }
}

/// How numeric columns are rescaled before training
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalingStrategy {
    /// Use values as they are
    #[default]
    None,
    /// Rescale into `[0, 1]`
    MinMax,
    /// Zero mean, unit variance
    Standard,
}

impl ScalingStrategy {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingStrategy::None => "NONE",
            ScalingStrategy::MinMax => "MIN_MAX",
            ScalingStrategy::Standard => "STANDARD",
        }
    }
}

impl Display for ScalingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalingStrategy {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [ScalingStrategy::None, ScalingStrategy::MinMax, ScalingStrategy::Standard]
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ContractError::InvalidParameter(format!("unknown scaling strategy '{}'", s)))
    }
}

/// Percent range of the dataset used as validation set, e.g. `[80, 100]`.
///
/// Serialized as a two element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 2]", into = "[u8; 2]")]
pub struct ValidationSplit {
    lower: u8,
    upper: u8,
}

impl ValidationSplit {
    /// Builds a split; both bounds in `[0, 100]` and `lower <= upper`
    pub fn new(lower: u8, upper: u8) -> ContractResult<Self> {
        if lower > 100 || upper > 100 {
            return Err(ContractError::InvalidParameter(format!(
                "validation split [{}, {}] is outside [0, 100]",
                lower, upper
            )));
        }
        if lower > upper {
            return Err(ContractError::InvalidParameter(format!(
                "validation split lower bound {} exceeds upper bound {}",
                lower, upper
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Lower bound in percent
    pub fn lower(&self) -> u8 {
        self.lower
    }

    /// Upper bound in percent
    pub fn upper(&self) -> u8 {
        self.upper
    }

    /// `[0, 100]` means "no split"
    pub fn is_full_range(&self) -> bool {
        self.lower == 0 && self.upper == 100
    }
}

impl Default for ValidationSplit {
    fn default() -> Self {
        Self { lower: 80, upper: 100 }
    }
}

impl TryFrom<[u8; 2]> for ValidationSplit {
    type Error = ContractError;

    fn try_from(value: [u8; 2]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1])
    }
}

impl From<ValidationSplit> for [u8; 2] {
    fn from(split: ValidationSplit) -> Self {
        [split.lower, split.upper]
    }
}

/// Create-model payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelForm {
    /// Unique model name
    pub name: String,
    /// Column the model predicts
    pub target_col: String,
    /// Columns excluded from the inputs
    pub drop_cols: Vec<String>,
    /// Imputation applied before training
    pub null_fill_strategy: NullFillStrategy,
    /// User-authored model definition code, sent verbatim
    pub model: String,
    /// User-authored hyperparameter and optimizer code, sent verbatim
    pub hyper_params_and_optimizer_code: String,
    /// Validation range
    pub validation_split: ValidationSplit,
}

impl ModelForm {
    /// Starts a form with the defaults the editor opens with
    pub fn new(name: impl Into<String>, target_col: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_col: target_col.into(),
            drop_cols: Vec::new(),
            null_fill_strategy: NullFillStrategy::Closest,
            model: String::new(),
            hyper_params_and_optimizer_code: String::new(),
            validation_split: ValidationSplit::default(),
        }
    }

    /// Sets the columns to drop
    pub fn with_drop_cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the null fill strategy
    pub fn with_null_fill_strategy(mut self, strategy: NullFillStrategy) -> Self {
        self.null_fill_strategy = strategy;
        self
    }

    /// Sets the model and optimizer code
    pub fn with_code(mut self, model: impl Into<String>, hyper_params: impl Into<String>) -> Self {
        self.model = model.into();
        self.hyper_params_and_optimizer_code = hyper_params.into();
        self
    }

    /// Sets the validation range
    pub fn with_validation_split(mut self, split: ValidationSplit) -> Self {
        self.validation_split = split;
        self
    }

    /// Checks the form with a validation split required
    pub fn validate(&self) -> ContractResult<()> {
        self.validate_with(true)
    }

    /// Checks the form before submission
    pub fn validate_with(&self, require_validation: bool) -> ContractResult<()> {
        if self.name.trim().is_empty() {
            return Err(ContractError::InvalidParameter("model name is required".into()));
        }
        if self.target_col.is_empty() {
            return Err(ContractError::InvalidParameter("target column is required".into()));
        }
        if self.drop_cols.iter().any(|col| col == &self.target_col) {
            return Err(ContractError::InvalidParameter(format!(
                "target column '{}' cannot be dropped",
                self.target_col
            )));
        }
        if require_validation && self.validation_split.is_full_range() {
            return Err(ContractError::InvalidParameter(
                "validation split [0, 100] leaves no training data".into(),
            ));
        }
        Ok(())
    }
}

/// A model as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetModel {
    /// Unique model name
    pub model_name: String,

    /// Column the model predicts
    #[serde(default)]
    pub target_col: Option<String>,

    /// Columns excluded from the inputs
    #[serde(default)]
    pub drop_cols: Vec<String>,

    /// Imputation applied before training
    #[serde(default)]
    pub null_fill_strategy: Option<NullFillStrategy>,

    /// Model definition code
    #[serde(default)]
    pub model_code: Option<String>,

    /// Hyperparameter and optimizer code
    #[serde(default)]
    pub hyper_params_and_optimizer_code: Option<String>,

    /// Validation range
    #[serde(default)]
    pub validation_split: Option<ValidationSplit>,

    /// Backend row id
    #[serde(default)]
    pub id: Option<i64>,

    /// Backend row id of the owning dataset
    #[serde(default)]
    pub dataset_id: Option<i64>,
}

/// Response body of the per-dataset model listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetModelList {
    /// Models of the dataset
    #[serde(default)]
    pub data: Vec<DatasetModel>,
}

/// Response body of the model lookup; `model` is null when it does not exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLookup {
    /// The model, if found
    #[serde(default)]
    pub model: Option<DatasetModel>,
}
