//! ragdb-core
//!
//! Shared data model, error kinds, collaborator traits and configuration for
//! the retrieval pipeline.

pub mod chunking;
pub mod config;
pub mod error;
pub mod settings;
pub mod traits;
pub mod types;

pub use error::{Collaborator, Error, Result};
