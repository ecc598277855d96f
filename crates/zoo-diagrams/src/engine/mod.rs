//! Diagram engines
//!
//! An engine is the capability that turns diagram containers into drawn
//! diagrams. The materializer only ever talks to it through
//! [`DiagramEngine`], and acquires it through an [`EngineLoader`] because
//! acquisition may suspend or fail (a script that never loads, a blocked
//! network).

mod detector;
mod prerender;

pub use detector::*;
pub use prerender::*;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::core::{DiagramError, EngineOptions};
use crate::dom::{Document, NodeId};

/// A diagram-drawing capability
pub trait DiagramEngine: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Configure the engine before a render pass
    fn initialize(&self, options: EngineOptions);

    /// Render the given containers in place
    ///
    /// Returns how many containers were rendered by this call.
    fn run(&self, document: &mut Document, containers: &[NodeId]) -> Result<usize, DiagramError>;
}

/// Asynchronous acquisition of a [`DiagramEngine`]
pub trait EngineLoader: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<Arc<dyn DiagramEngine>, DiagramError>>;
}
