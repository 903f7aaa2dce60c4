//! Outbound dispatch: the payload a station receives when a job is
//! handed to it, and the HTTP client that delivers it.

pub mod client;
pub mod payload;

pub use client::{DispatchError, StationClient};
pub use payload::DispatchPayload;
