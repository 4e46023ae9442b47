//! Tracking provider implementations

pub mod mock;

use crate::config::ProviderConfig;
use crate::core::provider::TrackingProvider;
use crate::error::{Error, Result};
use mock::MockTracker;

/// Create a tracking provider based on configuration
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn TrackingProvider>> {
    match config.kind.as_str() {
        "mock" => Ok(Box::new(MockTracker::new(config.clone()))),
        _ => Err(Error::UnknownProvider(config.kind.clone())),
    }
}
