use std::sync::Arc;

use fpb_core::{
    config::Config,
    store::{MemoryStore, RecordSource},
};

#[tokio::main]
async fn main() -> Result<(), fpb_core::Error> {
    fpb_core::logging::init("fpb")?;

    let cfg = Arc::new(Config::load()?);

    let store: Arc<dyn RecordSource> = Arc::new(MemoryStore::open(cfg.data_file.clone()).await?);

    fpb_telegram::router::run_polling(cfg, store)
        .await
        .map_err(|e| fpb_core::Error::External(format!("telegram bot failed: {e}")))?;

    tracing::info!("bot stopped");
    Ok(())
}
