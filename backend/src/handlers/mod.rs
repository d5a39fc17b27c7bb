//! HTTP handlers for the Livestock Stock Management Platform

pub mod health;
pub mod stock;
pub mod upload;

pub use health::*;
pub use stock::*;
pub use upload::*;
