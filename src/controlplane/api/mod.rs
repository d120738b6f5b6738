//! API Module
//!
//! REST surface over the cleanup orchestrator and the synthetic node
//! operations.

pub mod server;
pub mod rest;

pub use server::*;
pub use rest::*;
