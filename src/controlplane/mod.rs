//! Lifecycle Control Plane Module
//!
//! Coordinates the cascading teardown of a session's resources and exposes
//! it, together with the synthetic node operations, over REST.

pub mod orchestrator;
pub mod cleaners;
pub mod outcome;
pub mod metrics;
pub mod api;
pub mod backends;

pub use orchestrator::*;
pub use cleaners::*;
pub use outcome::*;
pub use metrics::*;
pub use api::*;
pub use backends::*;
