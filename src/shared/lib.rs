// Declare modules at the root level
pub mod classifier;
pub mod domain;
pub mod error;
pub mod history;
pub mod id_generator;
pub mod live_feed;
pub mod metric;
pub mod options;
pub mod registry;
pub mod simulator;
pub mod store;
pub mod time;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::classifier;
    pub use super::domain;
    pub use super::error;
    pub use super::history;
    pub use super::id_generator;
    pub use super::live_feed;
    pub use super::metric;
    pub use super::options;
    pub use super::registry;
    pub use super::simulator;
    pub use super::store;
    pub use super::time;
}

// Also re-export at root for convenience
pub use classifier::*;
pub use domain::*;
pub use error::*;
pub use history::*;
pub use id_generator::*;
pub use live_feed::*;
pub use metric::*;
pub use options::*;
pub use registry::*;
pub use simulator::*;
pub use store::*;
pub use time::*;
