//! Write-side engine: callback ingestion and the background run
//! dispatcher.

pub mod dispatcher;
pub mod ingest;

pub use dispatcher::RunDispatcher;
pub use ingest::EventIngest;
