//! Database layer for legalaider
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for conversation records
//! - A cache of raw clustering responses keyed by prompt hash

pub mod repo;
pub mod schema;

pub use repo::{CategoryCounts, Database};
