use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use rand::RngExt;
use tracing::info;

pub mod analysis;
pub mod bootstrap;
pub mod config;
pub mod dashboard;
pub mod data_ingestion;
pub mod error;
pub mod filter;
pub mod render;
pub mod server;

#[cfg(test)]
pub(crate) mod test_utils;

use data_ingestion::TIMESTAMP_FORMAT;

/// Brazilian state codes; SP carries extra weight below like in the real data.
const STATES: [&str; 27] = [
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA", "PB", "PE",
    "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];
const STATUSES: [&str; 4] = ["delivered", "shipped", "invoiced", "canceled"];
/// Purchases are spread over roughly two years from this date.
const FIRST_PURCHASE: (i32, u32, u32) = (2016, 9, 4);
const PURCHASE_WINDOW_SECS: i64 = 760 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDataSummary {
    pub orders: usize,
    pub customers: usize,
    /// Orders whose customer is absent from the customers file.
    pub orphan_orders: usize,
}

pub fn generate_mock_data(
    orders_path: &Path,
    customers_path: &Path,
    order_count: usize,
) -> std::io::Result<MockDataSummary> {
    // one writer per file, both filled in the same pass
    let mut orders = BufWriter::new(File::create(orders_path)?);
    let mut customers = BufWriter::new(File::create(customers_path)?);

    let mut rng = rand::rng();
    let (year, month, day) = FIRST_PURCHASE;
    let first_purchase = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN);
    // several customer_id rows map to the same physical customer
    let physical_customers = (order_count * 4 / 5).max(1);
    let mut customer_rows = 0;
    let mut orphan_orders = 0;

    writeln!(
        orders,
        "order_id,customer_id,order_status,order_purchase_timestamp"
    )?;
    writeln!(
        customers,
        "customer_id,customer_unique_id,customer_zip_code_prefix,customer_city,customer_state"
    )?;

    for record in 0..order_count {
        let order_id = format!("{record:032x}");
        if record > 0 && record % 1_000_000 == 0 {
            info!(orders = record, orphans = orphan_orders, "generating mock data");
        }

        let customer_id = format!("c{record:031x}");
        let status = STATUSES[rng.random_range(0..STATUSES.len())];
        let purchased =
            first_purchase + TimeDelta::seconds(rng.random_range(0..PURCHASE_WINDOW_SECS));

        writeln!(
            orders,
            "{order_id},{customer_id},{status},{}",
            purchased.format(TIMESTAMP_FORMAT)
        )?;

        // Leave ~0.1% of orders without a customer row so the join drops them
        if rng.random_range(0..1000) == 0 {
            orphan_orders += 1;
            continue;
        }

        let unique_id = format!("u{:031x}", rng.random_range(0..physical_customers));
        let state = if rng.random_range(0..10) < 4 {
            "SP"
        } else {
            STATES[rng.random_range(0..STATES.len())]
        };
        let zip = rng.random_range(1000..99999);
        writeln!(
            customers,
            "{customer_id},{unique_id},{zip:05},cidade {},{state}",
            state.to_lowercase()
        )?;
        customer_rows += 1;
    }

    orders.flush()?;
    customers.flush()?;

    let summary = MockDataSummary {
        orders: order_count,
        customers: customer_rows,
        orphan_orders,
    };
    info!(
        orders = summary.orders,
        customers = summary.customers,
        orphans = summary.orphan_orders,
        "mock data written"
    );
    Ok(summary)
}
