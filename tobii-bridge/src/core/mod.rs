//! Core abstractions for tracking providers.
//!
//! - [`provider::TrackingProvider`]: Trait to implement for new trackers
//! - [`types`]: Raw readings, normalized samples, and the distributed snapshot

pub mod provider;
pub mod types;
