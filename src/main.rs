//! PayFlow - Asynchronous Funds-Transfer Settlement Pipeline
//!
//! This is the main entry point. Architecture:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌──────────┐
//! │ Gateway  │───▶│  Queue   │───▶│  Settlement  │───▶│ Notifier │
//! │ (intake) │    │(at-least │    │   Workers    │    │   (WS)   │
//! │          │    │  -once)  │    │(ledger+store)│    │          │
//! └──────────┘    └──────────┘    └──────────────┘    └──────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use crossbeam_queue::ArrayQueue;
use tokio::sync::watch;

use payflow::config::AppConfig;
use payflow::gateway::{self, state::AppState};
use payflow::ledger::Ledger;
use payflow::store::StatusHistoryStore;
use payflow::transfer::queue::{InMemoryQueue, TransferQueue};
use payflow::transfer::{SettlementWorker, TransferIntake};
use payflow::websocket::{ConnectionManager, NotifierService, PushEvent};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env)?;
    let _log_guard = payflow::logging::init_logging(&config.logging);

    tracing::info!(env = %env, "Starting PayFlow settlement pipeline");

    // Seed the ledger. Account registration is handled upstream; the
    // config stands in for it here.
    let ledger = Arc::new(Ledger::new());
    for seed in config.accounts.iter().cloned() {
        let account = seed.into_account();
        tracing::info!(
            owner = %account.owner,
            account = %account.account,
            balance = %account.balance,
            "Seeded account"
        );
        ledger.register(account);
    }

    let store = Arc::new(StatusHistoryStore::with_retention(
        Duration::from_secs(config.retention.ttl_secs),
        config.retention.history_cap,
    ));
    let queue = Arc::new(InMemoryQueue::new(config.queue.capacity));
    let push_events: Arc<ArrayQueue<PushEvent>> =
        Arc::new(ArrayQueue::new(config.queue.push_capacity));
    let ws_manager = Arc::new(ConnectionManager::new());

    // Shutdown flag, observed by workers between messages.
    let (shutdown_tx, _) = watch::channel(false);

    // Settlement worker pool (consumer group).
    let worker_count = config.worker.instances.max(1);
    let mut worker_handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let worker = SettlementWorker::new(
            ledger.clone(),
            store.clone(),
            push_events.clone(),
            queue.subscribe(),
            config.worker.worker_config(),
            shutdown_tx.subscribe(),
        );
        worker_handles.push(tokio::spawn(worker.run()));
    }
    tracing::info!(workers = worker_count, "Settlement workers started");

    // Notifier: drains push events onto WebSocket connection groups.
    let notifier = NotifierService::new(
        ws_manager.clone(),
        push_events.clone(),
        shutdown_tx.subscribe(),
    );
    tokio::spawn(notifier.run());

    let intake = Arc::new(TransferIntake::new(
        ledger.clone(),
        store.clone(),
        queue.clone() as Arc<dyn TransferQueue>,
    ));
    let state = Arc::new(AppState::new(intake, store, ledger, ws_manager));
    let app = gateway::router(state);

    let port = get_port_override().unwrap_or(config.gateway.port);
    let addr = format!("{}:{}", config.gateway.host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    // Let in-flight settlements finish before exiting.
    let _ = shutdown_tx.send(true);
    for handle in worker_handles {
        let _ = handle.await;
    }
    tracing::info!("PayFlow stopped");

    Ok(())
}
