//! Lazily acquired diagram engine handle
//!
//! The engine is loaded on first use and shared afterwards. Concurrent
//! first uses wait on the same load instead of starting their own. A failed
//! load leaves the slot empty, so the next run tries again; within a run
//! the failure is final.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use futures::lock::Mutex;
use tracing::{debug, info};

use crate::core::Unavailable;
use crate::engine::{DiagramEngine, EngineLoader, PrerenderLoader};

/// Memoizing, single-flight provider of a [`DiagramEngine`]
pub struct EngineProvider {
    loader: Box<dyn EngineLoader>,
    slot: Mutex<Option<Arc<dyn DiagramEngine>>>,
    attempts: AtomicUsize,
}

impl EngineProvider {
    pub fn new(loader: impl EngineLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            slot: Mutex::new(None),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Process-wide provider backed by the built-in engine
    pub fn global() -> Arc<EngineProvider> {
        static GLOBAL: OnceLock<Arc<EngineProvider>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(EngineProvider::new(PrerenderLoader::default()))))
    }

    /// Get the engine, loading it if no earlier load succeeded
    pub async fn acquire(&self) -> Result<Arc<dyn DiagramEngine>, Unavailable> {
        let mut slot = self.slot.lock().await;
        if let Some(engine) = slot.as_ref() {
            debug!(engine = engine.name(), "Reusing loaded diagram engine");
            return Ok(Arc::clone(engine));
        }

        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(attempt, "Loading diagram engine");
        match self.loader.load().await {
            Ok(engine) => {
                info!(engine = engine.name(), attempt, "Diagram engine loaded");
                *slot = Some(Arc::clone(&engine));
                Ok(engine)
            }
            Err(e) => {
                debug!(attempt, error = %e, "Diagram engine load failed");
                Err(Unavailable::from(e))
            }
        }
    }

    /// How many times the loader has been invoked
    pub fn load_attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// True once a load has succeeded
    ///
    /// Reports `false` while a load is in flight.
    pub fn is_loaded(&self) -> bool {
        self.slot
            .try_lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}
