// Library root: re-exports all modules so integration tests and the binary
// can access the crate's public API.

pub mod config;
pub mod db;
pub mod engine;
pub mod league;
pub mod orchestrator;
pub mod stats;
