//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the gateway.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
