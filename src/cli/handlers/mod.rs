//! CLI command handlers
//!
//! - serve: API server
//! - ask: one-shot search
//! - info: candidate pool listing and configuration
//! - init: database schema

pub mod ask;
pub mod info;
pub mod init;
pub mod serve;

pub use ask::*;
pub use info::*;
pub use init::*;
pub use serve::*;
