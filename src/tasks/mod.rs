//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is alive.
//!
//! # Tasks
//! - Expiry sweep: Removes TTL-expired cache entries at a configured interval

mod sweep;

pub use sweep::{spawn_sweep_task, SweepHandle};
