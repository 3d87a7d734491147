//! Application layer orchestrating domain logic and infrastructure.

pub mod command;
pub mod export;
pub mod format;
pub mod inspect;
pub mod location;
pub mod parser;
pub mod progress;
pub mod reconstruct;
pub mod report;
pub mod session;
pub mod store;
