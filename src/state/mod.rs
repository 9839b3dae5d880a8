//! State module for per-run harvesting and probing state
//!
//! Nothing here outlives a single harvest or probe run; durable progress lives in
//! storage.
//!
//! # Components
//!
//! - `CredentialRotator`: Circular pool of search API credentials
//! - `ObservationWindow`: Bounded recency cache of observed subpaths
//! - `Marker`: Terminal probe outcome recorded on resolved URLs

mod marker;
mod rotator;
mod window;

// Re-export main types
pub use marker::Marker;
pub use rotator::CredentialRotator;
pub use window::ObservationWindow;
