//! Shared fixtures for unit tests.

use std::path::Path;

use tempfile::TempDir;

use crate::data_ingestion::{DataSources, Dataset, load_dataset};

pub const SAMPLE_ORDERS: &str = "\
order_id,customer_id,order_status,order_purchase_timestamp
o1,c1,delivered,2017-01-05 10:15:00
o2,c2,delivered,2017-01-28 23:59:59
o3,c3,shipped,2017-03-20 08:00:00
o4,c9,canceled,2017-02-11 12:00:00
";

/// c1 and c2 belong to the same physical customer.
pub const SAMPLE_CUSTOMERS: &str = "\
customer_id,customer_unique_id,customer_zip_code_prefix,customer_city,customer_state
c1,u1,01001,sao paulo,SP
c2,u1,01001,sao paulo,SP
c3,u2,20040,rio de janeiro,RJ
";

pub fn write_sources(dir: &Path, orders: &str, customers: &str) -> DataSources {
    let sources = DataSources {
        orders: dir.join("orders.csv"),
        customers: dir.join("customers.csv"),
    };
    std::fs::write(&sources.orders, orders).unwrap();
    std::fs::write(&sources.customers, customers).unwrap();
    sources
}

pub fn sample_sources() -> (TempDir, DataSources) {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_sources(dir.path(), SAMPLE_ORDERS, SAMPLE_CUSTOMERS);
    (dir, sources)
}

pub fn sample_dataset() -> Dataset {
    let (_dir, sources) = sample_sources();
    load_dataset(&sources).unwrap()
}

/// Builds a dataset from `(order_id, state, unique_id, timestamp)` rows,
/// one customer per order.
pub fn dataset_from_rows(rows: &[(&str, &str, &str, &str)]) -> Dataset {
    let mut orders = String::from("order_id,customer_id,order_purchase_timestamp\n");
    let mut customers = String::from("customer_id,customer_unique_id,customer_state\n");
    for (order_id, state, unique_id, timestamp) in rows {
        orders.push_str(&format!("{order_id},cust-{order_id},{timestamp}\n"));
        customers.push_str(&format!("cust-{order_id},{unique_id},{state}\n"));
    }

    let dir = tempfile::tempdir().unwrap();
    let sources = write_sources(dir.path(), &orders, &customers);
    load_dataset(&sources).unwrap()
}
