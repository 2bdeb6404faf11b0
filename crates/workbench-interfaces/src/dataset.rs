//! Dataset and column contracts

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::NullFillStrategy;

/// One entry of the dataset listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Unique dataset name
    pub table_name: String,

    /// Column names in dataset order
    #[serde(default)]
    pub columns: Vec<String>,

    /// Column holding the time axis, once chosen
    #[serde(default)]
    pub timeseries_col: Option<String>,

    /// First timestamp in the dataset (ms)
    #[serde(default)]
    pub start_date: Option<i64>,

    /// Last timestamp in the dataset (ms)
    #[serde(default)]
    pub end_date: Option<i64>,
}

/// Response body of the dataset listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetList {
    /// All datasets known to the backend
    pub tables: Vec<DatasetSummary>,
}

/// A dataset as returned by the detail lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Unique dataset name
    pub dataset_name: String,

    /// Column names in dataset order
    #[serde(default)]
    pub columns: Vec<String>,

    /// Column holding the time axis, once chosen
    #[serde(default)]
    pub timeseries_col: Option<String>,

    /// Column holding the traded price, once chosen
    #[serde(default)]
    pub price_column: Option<String>,

    /// Backend row id
    #[serde(default)]
    pub id: Option<i64>,
}

/// Response body of the dataset detail lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDetail {
    /// The dataset
    pub dataset: Dataset,
}

/// Summary statistics of a column.
///
/// Every field is optional: a statistic the backend has not computed is
/// reported as absent rather than as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Smallest value
    #[serde(default)]
    pub min: Option<f64>,
    /// Largest value
    #[serde(default)]
    pub max: Option<f64>,
    /// Arithmetic mean
    #[serde(default)]
    pub mean: Option<f64>,
    /// Median
    #[serde(default)]
    pub median: Option<f64>,
    /// Standard deviation
    #[serde(default)]
    pub std_dev: Option<f64>,
}

/// A single column of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its dataset
    pub name: String,

    /// Number of null cells
    #[serde(default)]
    pub null_count: u64,

    /// Row values in dataset order
    #[serde(default)]
    pub rows: Vec<Value>,

    /// Summary statistics, absent until the backend computed them
    #[serde(default)]
    pub stats: Option<ColumnStats>,
}

/// Response body of the column lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDetail {
    /// Time axis column of the owning dataset
    #[serde(default)]
    pub timeseries_col: Option<String>,

    /// The column
    pub column: Column,
}

/// A market-data symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Trading pair symbol, e.g. `BTCUSDT`
    pub symbol: String,

    /// Last known price, as reported by the source
    #[serde(default)]
    pub price: Option<String>,
}

/// Response body of the ticker listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerList {
    /// Every pair offered by the market-data source
    #[serde(default)]
    pub pairs: Vec<Ticker>,
}

/// Payload for running user code.
///
/// `code` is transmitted verbatim. The null-fill strategy is only sent for
/// whole-dataset execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecCodePayload {
    /// User-authored code
    pub code: String,

    /// Imputation policy applied after the code ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_fill_strategy: Option<NullFillStrategy>,
}

impl ExecCodePayload {
    /// Payload for column execution
    pub fn for_column(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            null_fill_strategy: None,
        }
    }

    /// Payload for whole-dataset execution
    pub fn for_dataset(code: impl Into<String>, strategy: NullFillStrategy) -> Self {
        Self {
            code: code.into(),
            null_fill_strategy: Some(strategy),
        }
    }
}

/// Payload for renaming a column in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameColumnPayload {
    /// Current column name
    pub old_col_name: String,
    /// Desired column name
    pub new_col_name: String,
}

/// Payload for appending columns from another dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddColumnsPayload {
    /// Source dataset
    pub table_name: String,

    /// Columns of the source dataset to append
    pub new_cols: Vec<String>,

    /// Column the two datasets are joined on; the time axis when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_column: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_column_without_stats_reports_absent() {
        let detail: ColumnDetail = serde_json::from_value(json!({
            "timeseries_col": "kline_open_time",
            "column": {"name": "close_price", "null_count": 2, "rows": [1.0, null, 3.0]}
        }))
        .unwrap();

        assert_eq!(detail.column.stats, None);
        assert_eq!(detail.column.rows.len(), 3);
    }

    #[test]
    fn test_partial_stats_stay_partial() {
        let stats: ColumnStats = serde_json::from_value(json!({"min": 0.5, "max": 9.0})).unwrap();
        assert_eq!(stats.mean, None);
        assert_eq!(stats.min, Some(0.5));
    }

    #[test]
    fn test_exec_payload_shapes() {
        let column = serde_json::to_value(ExecCodePayload::for_column("x = 1")).unwrap();
        assert_eq!(column, json!({"code": "x = 1"}));

        let dataset =
            serde_json::to_value(ExecCodePayload::for_dataset("x = 1", NullFillStrategy::Mean))
                .unwrap();
        assert_eq!(dataset, json!({"code": "x = 1", "null_fill_strategy": "MEAN"}));
    }
}
