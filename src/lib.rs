pub mod catalog;
pub mod download;
pub mod error;
pub mod file;
pub mod job;
pub mod logging;
pub mod options;
pub mod orchestrator;
