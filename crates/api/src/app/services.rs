use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use gyaledger_alerts::AlertConfig;
use gyaledger_audit::InMemoryAuditLog;
use gyaledger_engine::{
    spawn_worker, AlertScanner, LedgerEngine, LedgerEvent, LedgerStore, MetricsPipeline,
};
use gyaledger_events::{EventBus, EventEnvelope, InMemoryEventBus};

use crate::cache::SalesCache;

pub type Bus = Arc<InMemoryEventBus<EventEnvelope<LedgerEvent>>>;

/// Everything the handlers need, wired once at startup.
pub struct AppServices {
    pub engine: LedgerEngine<Bus>,
    pub store: Arc<LedgerStore>,
    pub scanner: AlertScanner,
    pub sales_cache: SalesCache,
    shutdown: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AppServices {
    /// Stop the pipeline worker (tests and graceful shutdown).
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(worker) = handle {
            let _ = worker.join();
        }
    }
}

/// Wire the in-memory stack: store + engine + bus-fed metrics worker.
pub fn build_services() -> Arc<AppServices> {
    let store = Arc::new(LedgerStore::new());
    store.provision_default_banks();

    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let subscription = bus.subscribe();

    let engine = LedgerEngine::new(store.clone(), Arc::new(InMemoryAuditLog::new()), bus);

    let pipeline = Arc::new(MetricsPipeline::new(store.clone()));
    let shutdown = Arc::new(AtomicBool::new(false));
    let worker = spawn_worker(pipeline, subscription, shutdown.clone());

    let scanner = AlertScanner::new(store.clone(), AlertConfig::default());

    Arc::new(AppServices {
        engine,
        store,
        scanner,
        sales_cache: SalesCache::new(Duration::from_secs(15)),
        shutdown,
        worker: Mutex::new(Some(worker)),
    })
}
