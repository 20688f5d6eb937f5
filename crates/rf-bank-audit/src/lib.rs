//! # rf-bank-audit — SoundBank Inclusion Audit
//!
//! Finds Wwise events that exist in the project but are not packaged into any
//! SoundBank.
//!
//! ## Features
//!
//! - Typed project queries over WAAPI
//! - Inclusion resolution through containers (work units, folders, actor-mixers)
//! - Timestamped CSV report of unincluded events
//! - Wwise add-on command installer

pub mod audit;
pub mod config;
pub mod error;
pub mod install;
pub mod model;
pub mod queries;
pub mod reconcile;
pub mod report;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use audit::*;
pub use config::*;
pub use error::*;
pub use install::*;
pub use model::*;
pub use queries::*;
pub use reconcile::*;
pub use report::*;
pub use resolver::*;
