//! In-app navigation paths handed back to views as navigation hints.

use crate::endpoints::segment;
use crate::error::WorkbenchResult;

/// Editor tab opened by default when jumping to the dataset editor
const EDITOR_DEFAULT_TAB: usize = 1;

/// Query string selecting the editor tab at `idx`
pub fn query_param_default_tab(idx: usize) -> String {
    format!("?defaultTab={}", idx)
}

/// Overview page of a dataset
pub fn dataset_info_path(dataset: &str) -> WorkbenchResult<String> {
    Ok(format!("/data/datasets/{}", segment("dataset name", dataset)?))
}

/// Dataset editor, opened on its default tab
pub fn dataset_editor_path(dataset: &str) -> WorkbenchResult<String> {
    Ok(format!(
        "{}/editor{}",
        dataset_info_path(dataset)?,
        query_param_default_tab(EDITOR_DEFAULT_TAB)
    ))
}

/// Detail page of one column
pub fn dataset_column_path(dataset: &str, column: &str) -> WorkbenchResult<String> {
    Ok(format!(
        "{}/columns/{}",
        dataset_info_path(dataset)?,
        segment("column name", column)?
    ))
}

/// Overview page of a model
pub fn model_info_path(dataset: &str, model: &str) -> WorkbenchResult<String> {
    Ok(format!(
        "{}/models/{}",
        dataset_info_path(dataset)?,
        segment("model name", model)?
    ))
}

/// Status page of one training job
pub fn train_job_path(dataset: &str, model: &str, train_job_id: &str) -> WorkbenchResult<String> {
    Ok(format!(
        "{}/trainjobs/{}",
        model_info_path(dataset, model)?,
        segment("train job id", train_job_id)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_path_opens_second_tab() {
        assert_eq!(
            dataset_editor_path("btc_1h").unwrap(),
            "/data/datasets/btc_1h/editor?defaultTab=1"
        );
    }

    #[test]
    fn test_column_path_escapes_names() {
        assert_eq!(
            dataset_column_path("btc 1h", "close/open").unwrap(),
            "/data/datasets/btc%201h/columns/close%2Fopen"
        );
    }

    #[test]
    fn test_train_job_path() {
        assert_eq!(
            train_job_path("btc_1h", "lin", "7").unwrap(),
            "/data/datasets/btc_1h/models/lin/trainjobs/7"
        );
        assert!(train_job_path("btc_1h", "", "7").is_err());
    }
}
