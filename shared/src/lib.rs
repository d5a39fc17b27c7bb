//! Shared types and models for the Livestock Stock Management Platform
//!
//! This crate contains the domain model, the derived-metrics calculator and
//! the filter engine shared between the backend and its tests. Everything in
//! here is pure: no I/O, no async.

pub mod filter;
pub mod metrics;
pub mod models;
pub mod types;
pub mod validation;

pub use filter::*;
pub use metrics::*;
pub use models::*;
pub use types::*;
pub use validation::*;
