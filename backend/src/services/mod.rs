//! Business logic services for the Livestock Stock Management Platform

pub mod stock;

pub use stock::StockService;
