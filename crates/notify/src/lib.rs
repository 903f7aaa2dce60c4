//! In-process notification plumbing: the status update bus that carries
//! fresh run/job representations out of ingestion, and the long-poll
//! registry that resolves waiting readers.

pub mod bus;
pub mod registry;

pub use bus::{StatusUpdate, UpdateBus};
pub use registry::PollRegistry;
