use std::sync::Arc;

use clap::Parser;
use tracing::info;

use olist_dashboard::bootstrap::init_tracing;
use olist_dashboard::config::{Cli, Command};
use olist_dashboard::data_ingestion::DatasetCache;
use olist_dashboard::generate_mock_data;
use olist_dashboard::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            let cache = Arc::new(DatasetCache::new(args.sources()));
            // a dataset that cannot be loaded stops the process before binding
            let dataset = cache.get()?;
            info!(
                rows = dataset.len(),
                states = dataset.states().len(),
                "dashboard ready"
            );
            server::serve(cache, &args.host, args.port).await?;
        }
        Command::Generate(args) => {
            generate_mock_data(&args.orders_out, &args.customers_out, args.count)?;
        }
    }

    Ok(())
}
