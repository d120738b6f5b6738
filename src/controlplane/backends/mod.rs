//! Port Adapters
//!
//! Provides in-process implementations of the domain ports:
//! - Memory: DashMap-backed persistence
//! - Standalone: sessions, resource manager and domain services

pub mod memory;
pub mod standalone;

pub use memory::*;
pub use standalone::*;
