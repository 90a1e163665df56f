//! postrag: grounded answers over community posts
//!
//! A question is answered from the newest globally visible posts. The posts
//! that overlap the question best are numbered into a prompt, a text
//! generation provider writes the answer, and the numbered posts it cited are
//! returned next to it.

pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod session;

pub use config::AppConfig;
pub use errors::*;
