//! Core building blocks shared by every part of the materializer
//!
//! Errors, logging setup, configuration and the small value types that flow
//! between the document model, the engine and the hosts.

mod config;
mod error;
pub mod logging;
mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
