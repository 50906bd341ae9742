//! Loading and joining the orders and customers CSV files.
//!
//! The joined frame is built once per process through [`DatasetCache`] and
//! only read afterwards.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::error::{DashboardError, Result};

pub const ORDER_ID: &str = "order_id";
pub const CUSTOMER_ID: &str = "customer_id";
pub const PURCHASE_TIMESTAMP: &str = "order_purchase_timestamp";
pub const CUSTOMER_UNIQUE_ID: &str = "customer_unique_id";
pub const CUSTOMER_STATE: &str = "customer_state";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ORDER_COLUMNS: [&str; 3] = [ORDER_ID, CUSTOMER_ID, PURCHASE_TIMESTAMP];
const CUSTOMER_COLUMNS: [&str; 3] = [CUSTOMER_ID, CUSTOMER_UNIQUE_ID, CUSTOMER_STATE];

/// Locations of the two input files.
#[derive(Debug, Clone)]
pub struct DataSources {
    pub orders: PathBuf,
    pub customers: PathBuf,
}

/// Observed purchase date range of a dataset, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateBounds {
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.min, self.max)
    }
}

/// Orders joined with their customers, one row per order.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    states: Vec<String>,
    date_bounds: Option<DateBounds>,
}

impl Dataset {
    pub fn new(frame: DataFrame) -> Result<Self> {
        let states = distinct_states(&frame)?;
        let date_bounds = purchase_date_bounds(&frame)?;
        Ok(Self {
            frame,
            states,
            date_bounds,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Distinct state codes, sorted.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// `None` when the join produced no rows.
    pub fn date_bounds(&self) -> Option<DateBounds> {
        self.date_bounds
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// Process-wide load-once holder for the joined dataset. The outcome of the
/// first load, success or failure, is kept for the life of the cache.
pub struct DatasetCache {
    sources: DataSources,
    cell: OnceLock<std::result::Result<Arc<Dataset>, Arc<DashboardError>>>,
}

impl DatasetCache {
    pub fn new(sources: DataSources) -> Self {
        Self {
            sources,
            cell: OnceLock::new(),
        }
    }

    pub fn sources(&self) -> &DataSources {
        &self.sources
    }

    /// Returns the dataset, reading the files on first access only.
    pub fn get(&self) -> Result<Arc<Dataset>> {
        self.cell
            .get_or_init(|| {
                load_dataset(&self.sources)
                    .map(Arc::new)
                    .map_err(Arc::new)
            })
            .clone()
            .map_err(DashboardError::LoadFailed)
    }
}

/// Reads both files, inner-joins them on `customer_id` and parses the
/// purchase timestamp.
pub fn load_dataset(sources: &DataSources) -> Result<Dataset> {
    let orders = read_csv(&sources.orders)?;
    require_columns(&orders, &ORDER_COLUMNS, &sources.orders)?;

    let customers = read_csv(&sources.customers)?;
    require_columns(&customers, &CUSTOMER_COLUMNS, &sources.customers)?;

    let order_rows = orders.height();
    let customer_rows = customers.height();

    let frame = orders
        .lazy()
        .join(
            customers.lazy(),
            [col(CUSTOMER_ID)],
            [col(CUSTOMER_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .with_column(col(PURCHASE_TIMESTAMP).str().to_datetime(
            Some(TimeUnit::Microseconds),
            None,
            StrptimeOptions {
                format: Some(TIMESTAMP_FORMAT.into()),
                ..Default::default()
            },
            lit("raise"),
        ))
        .collect()?;

    info!(
        orders = order_rows,
        customers = customer_rows,
        joined = frame.height(),
        "dataset loaded"
    );

    Dataset::new(frame)
}

/// Every column is read as a string; typed columns are parsed after the join.
fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(DashboardError::MissingFile(path.to_path_buf()));
    }

    let frame = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;
    Ok(frame)
}

fn require_columns(frame: &DataFrame, columns: &[&'static str], path: &Path) -> Result<()> {
    match columns
        .iter()
        .find(|column| frame.get_column_index(column).is_none())
    {
        Some(column) => Err(DashboardError::MissingColumn {
            column: *column,
            path: path.to_path_buf(),
        }),
        None => Ok(()),
    }
}

fn distinct_states(frame: &DataFrame) -> Result<Vec<String>> {
    let states: BTreeSet<String> = frame
        .column(CUSTOMER_STATE)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_owned)
        .collect();
    Ok(states.into_iter().collect())
}

fn purchase_date_bounds(frame: &DataFrame) -> Result<Option<DateBounds>> {
    let bounds = frame
        .clone()
        .lazy()
        .select([
            col(PURCHASE_TIMESTAMP).min().cast(DataType::Int64).alias("min"),
            col(PURCHASE_TIMESTAMP).max().cast(DataType::Int64).alias("max"),
        ])
        .collect()?;

    let min = bounds.column("min")?.i64()?.get(0);
    let max = bounds.column("max")?.i64()?.get(0);

    Ok(match (min.and_then(micros_to_date), max.and_then(micros_to_date)) {
        (Some(min), Some(max)) => Some(DateBounds { min, max }),
        _ => None,
    })
}

fn micros_to_date(micros: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_micros(micros).map(|ts| ts.date_naive())
}
