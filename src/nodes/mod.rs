//! Synthetic Node Module
//!
//! Bookkeeping for nodes that no cloud provisions: placeholder clouds,
//! synthesized node candidates, host name resolution and node source
//! decommissioning.

pub mod candidate;
pub mod decommission;
pub mod dummy_cloud;
pub mod hostname;
pub mod lookup;

pub use candidate::*;
pub use decommission::*;
pub use dummy_cloud::*;
pub use hostname::*;
pub use lookup::*;
