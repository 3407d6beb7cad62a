use std::sync::Arc;

use rangeserve::config::{self, AppState};
use rangeserve::logger;
use rangeserve::server;
use rangeserve::store::FileSystemStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: configuration file path
    let cfg = match std::env::args().nth(1) {
        Some(path) => config::Config::load_from(&path)?,
        None => config::Config::load()?,
    };

    logger::init(&cfg)?;

    // Create the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    let store = FileSystemStore::new(&cfg.streaming.storage_root);
    if !store.root().is_dir() {
        logger::log_warning(&format!(
            "Storage root {} is not a directory; every stream request will 404",
            store.root().display()
        ));
    }

    logger::log_server_start(&addr, &cfg);
    let state = Arc::new(AppState::new(cfg, Arc::new(store)));

    let shutdown = Arc::new(server::ShutdownSignal::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;

    server::run(listener, state, shutdown).await;
    Ok(())
}
