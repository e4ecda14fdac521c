// src/domain/mod.rs
pub mod errors;
pub mod models;

// Re-export common types for convenience
pub use errors::{AppError, AppResult, ExchangeError, ExchangeResult};
pub use models::{Level, OrderBook, Pair, Quote};
