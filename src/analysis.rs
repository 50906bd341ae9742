//! Aggregates shown on the dashboard: the two metric cards and the data
//! behind both charts.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::Serialize;

use crate::data_ingestion::{CUSTOMER_STATE, CUSTOMER_UNIQUE_ID, PURCHASE_TIMESTAMP};
use crate::error::Result;

const ORDER_COUNT: &str = "order_count";
const YEAR: &str = "year";
const MONTH: &str = "month";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Metrics {
    /// "Total de Pedidos"
    pub total_orders: usize,
    /// "Total de Clientes Únicos"
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCount {
    pub state: String,
    pub orders: u64,
}

/// Orders purchased in the month ending on `month_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month_end: NaiveDate,
    pub orders: u64,
}

pub fn metrics(frame: &DataFrame) -> Result<Metrics> {
    let total_orders = frame.height();
    if total_orders == 0 {
        return Ok(Metrics::default());
    }

    // missing ids are not a customer
    let unique_customers = frame
        .column(CUSTOMER_UNIQUE_ID)?
        .as_materialized_series()
        .drop_nulls()
        .n_unique()?;
    Ok(Metrics {
        total_orders,
        unique_customers,
    })
}

/// Order count per state, ascending by count then by state code.
pub fn orders_by_state(frame: &DataFrame) -> Result<Vec<StateCount>> {
    let counts = frame
        .clone()
        .lazy()
        .group_by([col(CUSTOMER_STATE)])
        .agg([len().cast(DataType::UInt64).alias(ORDER_COUNT)])
        .sort_by_exprs(
            [col(ORDER_COUNT), col(CUSTOMER_STATE)],
            SortMultipleOptions::default(),
        )
        .collect()?;

    let states = counts.column(CUSTOMER_STATE)?.str()?;
    let orders = counts.column(ORDER_COUNT)?.u64()?;

    Ok(states
        .into_iter()
        .zip(orders)
        .filter_map(|(state, orders)| {
            Some(StateCount {
                state: state?.to_string(),
                orders: orders?,
            })
        })
        .collect())
}

/// Order count per calendar month, chronological. Months between the first
/// and last purchase without any order are reported with a zero count.
pub fn monthly_orders(frame: &DataFrame) -> Result<Vec<MonthlyCount>> {
    let counts = frame
        .clone()
        .lazy()
        .select([
            col(PURCHASE_TIMESTAMP)
                .dt()
                .year()
                .cast(DataType::Int32)
                .alias(YEAR),
            col(PURCHASE_TIMESTAMP)
                .dt()
                .month()
                .cast(DataType::Int32)
                .alias(MONTH),
        ])
        .group_by([col(YEAR), col(MONTH)])
        .agg([len().cast(DataType::UInt64).alias(ORDER_COUNT)])
        .collect()?;

    let years = counts.column(YEAR)?.i32()?;
    let months = counts.column(MONTH)?.i32()?;
    let orders = counts.column(ORDER_COUNT)?.u64()?;

    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for ((year, month), count) in years.into_iter().zip(months).zip(orders) {
        // null timestamps have no month
        let (Some(year), Some(month), Some(count)) = (year, month, count) else {
            continue;
        };
        if let Some(first) = u32::try_from(month)
            .ok()
            .and_then(|month| NaiveDate::from_ymd_opt(year, month, 1))
        {
            *buckets.entry(first).or_default() += count;
        }
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Ok(Vec::new());
    };

    let mut series = Vec::with_capacity(buckets.len());
    let mut month = first;
    while month <= last {
        let next = next_month(month);
        series.push(MonthlyCount {
            month_end: next.pred_opt().unwrap_or(month),
            orders: buckets.get(&month).copied().unwrap_or(0),
        });
        month = next;
    }
    Ok(series)
}

/// First day of the month after `first_of_month`.
fn next_month(first_of_month: NaiveDate) -> NaiveDate {
    let (year, month) = match first_of_month.month() {
        12 => (first_of_month.year() + 1, 1),
        m => (first_of_month.year(), m + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}
