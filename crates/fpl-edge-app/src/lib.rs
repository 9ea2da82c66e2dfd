// Library root: re-exports all modules so integration tests and the binary
// share one public API.

pub mod captain;
pub mod config;
pub mod ingest;
pub mod report;
pub mod upstream;
