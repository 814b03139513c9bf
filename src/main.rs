//! roomwatch binary: wires configuration, adapters and pipeline tasks.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use roomwatch::adapters::{
    FileKeyValueStore, HostnameDeviceDirectory, HttpBusAuthenticator, HttpEventSource,
    HttpRoomStatusSource, InMemoryKeyValueStore, RedisKeyValueStore,
};
use roomwatch::application::{
    event_channel, load_snapshot_until_shutdown, AggregatorConfig, LifecycleCoordinator,
    SessionManager, StateAggregator, StreamReader, StreamReaderConfig,
};
use roomwatch::config::{AppConfig, LoggingConfig, StatusConfig, StoreBackend, StoreConfig};
use roomwatch::ports::KeyValueStore;

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn open_store(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store, records are lost on exit");
            Arc::new(InMemoryKeyValueStore::new())
        }
        StoreBackend::File => {
            info!(path = %config.path.display(), "Opening file store");
            Arc::new(FileKeyValueStore::open(&config.path).await?)
        }
        StoreBackend::Redis => {
            let url = config.redis_url.as_deref().unwrap_or_default();
            info!("Connecting to redis store");
            Arc::new(
                RedisKeyValueStore::connect(url, config.key_prefix.clone().unwrap_or_default())
                    .await?,
            )
        }
    };
    Ok(store)
}

fn status_source(config: &StatusConfig) -> Result<Option<HttpRoomStatusSource>, Box<dyn std::error::Error>> {
    match config.endpoints() {
        Some((configuration_url, status_url)) => Ok(Some(HttpRoomStatusSource::new(
            configuration_url,
            status_url,
            config.timeout(),
        )?)),
        None => {
            info!("No status endpoints configured, starting without snapshot");
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.logging);
    info!(
        address = %config.event_bus.address,
        store = ?config.store.backend,
        "Starting roomwatch"
    );

    let store = open_store(&config.store).await?;
    let status = status_source(&config.status)?;

    let bus = config.event_bus.client_config();
    let sessions = Arc::new(SessionManager::new(Arc::new(HttpBusAuthenticator::new(
        bus.clone(),
    )?)));
    let source = Arc::new(HttpEventSource::new(bus)?);

    let mut lifecycle = LifecycleCoordinator::new(config.pipeline.shutdown_grace());
    let (tx, rx) = event_channel(config.pipeline.channel_capacity);

    let aggregator = StateAggregator::new(
        store,
        Arc::new(HostnameDeviceDirectory::new()),
        AggregatorConfig {
            flush_window: config.pipeline.flush_window(),
        },
    );
    // The snapshot loads inside the task so a signal during the walk still
    // goes through the coordinator.
    let mut signal = lifecycle.signal();
    lifecycle.register(
        "state_aggregator",
        tokio::spawn(async move {
            let snapshot = match status {
                Some(source) => load_snapshot_until_shutdown(&source, &mut signal)
                    .await
                    .unwrap_or_default(),
                None => Vec::new(),
            };
            aggregator.run(rx, snapshot, signal).await;
        }),
    );

    let reader = StreamReader::new(
        sessions,
        source,
        StreamReaderConfig {
            reconnect_delay: config.event_bus.reconnect_delay(),
        },
    );
    let signal = lifecycle.signal();
    lifecycle.register(
        "stream_reader",
        tokio::spawn(async move {
            reader.run(tx, signal).await;
        }),
    );

    if let Err(e) = lifecycle.await_termination_signal().await {
        error!(error = %e, "Cannot wait for termination signal, shutting down");
    }

    lifecycle.broadcast();
    if let Err(stall) = lifecycle.wait_for_all().await {
        error!(error = %stall, "Shutdown stalled");
        std::process::exit(1);
    }

    info!("roomwatch stopped");
    Ok(())
}
