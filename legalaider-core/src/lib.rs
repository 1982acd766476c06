//! # legalaider-core
//!
//! Core library for legalaider - time-savings accounting for AI-assisted
//! legal consultations.
//!
//! This library provides:
//! - Domain types for conversation records and reports
//! - The duration estimator and traditional-time savings model
//! - LLM-backed topic and FAQ clustering
//! - Report assembly and chart data
//! - SQLite storage, configuration and logging
//!
//! ## Pipeline
//!
//! - **Import:** legacy chat store files land in the conversation store
//! - **Analysis:** each record gets a chat duration and a time-savings breakdown
//! - **Report:** analyzed records are aggregated per category into a [`Report`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use legalaider_core::{Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

pub mod analysis;
pub mod charts;
pub mod clustering;
pub mod config;
pub mod db;
pub mod error;
pub mod estimator;
pub mod llm;
pub mod logging;
pub mod report;
pub mod savings;
pub mod store;
pub mod types;
