//! A live page driven by triggers
//!
//! Ties a document owned by the host to a [`Materializer`] on a
//! single-threaded executor. Every trigger spawns an independent run; a run
//! holds the document only after its engine is in hand, so runs whose
//! acquisition is still pending never block one another.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use tracing::{debug, info_span, warn, Instrument};

use super::Materializer;
use crate::core::{Environment, MaterializeReport};
use crate::dom::Document;

/// A host document together with the materializer runs made against it
///
/// Each completed run appends its report. Long-lived pages should drain them
/// with [`LivePage::take_reports`].
pub struct LivePage {
    document: RefCell<Document>,
    materializer: Materializer,
    environment: Environment,
    reports: RefCell<Vec<MaterializeReport>>,
}

impl LivePage {
    pub fn new(document: Document, materializer: Materializer, environment: Environment) -> Rc<Self> {
        Rc::new(Self {
            document: RefCell::new(document),
            materializer,
            environment,
            reports: RefCell::new(Vec::new()),
        })
    }

    /// Current document
    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    /// Swap in the document of the page navigated to
    pub fn navigate(&self, document: Document) {
        debug!(nodes = document.len(), "Page content replaced");
        *self.document.borrow_mut() = document;
    }

    /// Reports of every completed run, oldest first
    pub fn reports(&self) -> Vec<MaterializeReport> {
        self.reports.borrow().clone()
    }

    /// Drain the reports of completed runs, oldest first
    pub fn take_reports(&self) -> Vec<MaterializeReport> {
        std::mem::take(&mut *self.reports.borrow_mut())
    }

    /// One materializer run against the current document
    pub async fn reconcile(self: Rc<Self>) -> MaterializeReport {
        let span = info_span!("reconcile", environment = %self.environment);
        async {
            let report = match self.materializer.prepare(self.environment).await {
                Ok(engine) => self
                    .materializer
                    .apply(engine.as_ref(), &mut self.document.borrow_mut()),
                Err(report) => report,
            };
            self.reports.borrow_mut().push(report.clone());
            report
        }
        .instrument(span)
        .await
    }

    /// Callback for [`super::install_triggers`] that spawns a run per call
    pub fn runner<S>(self: &Rc<Self>, spawner: S) -> Rc<dyn Fn()>
    where
        S: LocalSpawn + 'static,
    {
        let page = Rc::clone(self);
        Rc::new(move || {
            let page = Rc::clone(&page);
            if let Err(e) = spawner.spawn_local(async move {
                page.reconcile().await;
            }) {
                warn!(error = %e, "Could not schedule diagram run");
            }
        })
    }
}
