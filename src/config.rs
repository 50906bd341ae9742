//! Command line and environment configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data_ingestion::DataSources;

pub const DEFAULT_ORDERS_CSV: &str = "olist_orders_dataset.csv";
pub const DEFAULT_CUSTOMERS_CSV: &str = "olist_customers_dataset.csv";

#[derive(Parser, Debug)]
#[command(name = "olist-dashboard")]
#[command(about = "Interactive sales dashboard over the Olist orders and customers datasets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the datasets and serve the dashboard page
    Serve(ServeArgs),
    /// Write synthetic orders and customers CSV files
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Orders CSV file
    #[arg(long, env = "OLIST_ORDERS_CSV", default_value = DEFAULT_ORDERS_CSV)]
    pub orders: PathBuf,

    /// Customers CSV file
    #[arg(long, env = "OLIST_CUSTOMERS_CSV", default_value = DEFAULT_CUSTOMERS_CSV)]
    pub customers: PathBuf,

    /// Address to bind
    #[arg(short = 'H', long, env = "OLIST_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "OLIST_PORT", default_value_t = 8501)]
    pub port: u16,
}

impl ServeArgs {
    pub fn sources(&self) -> DataSources {
        DataSources {
            orders: self.orders.clone(),
            customers: self.customers.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long, default_value = DEFAULT_ORDERS_CSV)]
    pub orders_out: PathBuf,

    #[arg(long, default_value = DEFAULT_CUSTOMERS_CSV)]
    pub customers_out: PathBuf,

    /// Number of orders to generate
    #[arg(short, long, default_value_t = 100_000)]
    pub count: usize,
}
