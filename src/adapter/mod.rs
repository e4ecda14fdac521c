// src/adapter/mod.rs
// HTTP interface over the exchange registry

pub mod registry;
pub mod router;
pub mod server;

pub use registry::Registry;
pub use router::Router;
pub use server::{serve, shutdown_signal};
