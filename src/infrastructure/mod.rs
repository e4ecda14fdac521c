// src/infrastructure/mod.rs
pub mod cache;
