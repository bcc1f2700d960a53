//! bouquetd: bouquet registry, membership reconciliation and channel mapping
//! policy for a broadcast backend.

pub mod bouquet;
pub mod config;
pub mod database;
pub mod logging;
