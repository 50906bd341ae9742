use std::path::PathBuf;
use std::sync::Arc;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while loading the datasets or building a dashboard view.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("data file not found: {0}")]
    MissingFile(PathBuf),

    #[error("column `{column}` missing from {path}")]
    MissingColumn { column: &'static str, path: PathBuf },

    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("dataset load failed: {0}")]
    LoadFailed(Arc<DashboardError>),

    #[error("page rendering failed")]
    Render(#[from] std::fmt::Error),

    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
