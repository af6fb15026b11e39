//! Core types and shared functionality for ee-draws.
//!
//! This crate provides:
//! - Draw history domain types and rank estimation
//! - History store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod model;
pub mod rank;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use model::{BUCKET_COUNT, DrawRecord, PoolSnapshot, ProgramScope};
pub use rank::{InvalidScore, RankInterval};
pub use store::{DrawSync, HistoryDb, HistoryStore, PoolSync, TrendPeriod};
