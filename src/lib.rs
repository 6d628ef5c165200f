//! Gallery Mirror - resilient access layer for a remote photo-gallery API
//!
//! Provides signed, retried upstream access with TTL/LRU caching and
//! request coalescing, behind a single facade.

pub mod api;
pub mod cache;
pub mod coalescer;
pub mod config;
pub mod error;
pub mod facade;
pub mod models;
pub mod repository;
pub mod tasks;
pub mod transport;

pub use api::AppState;
pub use config::Config;
pub use error::{GalleryError, Result};
pub use facade::GalleryFacade;
pub use tasks::{spawn_sweep_task, SweepHandle};
