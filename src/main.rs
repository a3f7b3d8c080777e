use std::sync::Arc;

use clap::Parser;
use prevue::{
    api::{serve, AppState},
    config::Config,
    options, reaper,
    store::Store,
};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = options::Args::parse();
    debug!("{args:?}");

    let config = Config::new(args.config)?;
    let store = Arc::new(Store::new(&config.system.data_path).await?);
    store.migrate().await?;

    if args.gc {
        let reaped = reaper::garbage_collect(&store).await?;
        info!("gc done, {reaped} previews removed");
        return Ok(());
    }

    let _reaper = config
        .preview
        .gc_interval()
        .map(|period| reaper::spawn_periodic(store.clone(), period));

    let addr = args
        .address
        .unwrap_or_else(|| config.system.bind_addr.clone());
    serve(AppState::new(store, &config), addr).await?;
    Ok(())
}
