// src/lib.rs
// Main library module declarations

pub mod adapter;
pub mod config;
pub mod domain;
pub mod exchange;
pub mod infrastructure;
