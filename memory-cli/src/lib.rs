//! # memory-cli
//!
//! `cmem`: interactive chat on top of conversation memory, plus one-shot retrieval,
//! summary and delete commands. Config comes from the environment (`.env` is loaded).

pub mod chat;
pub mod cli;
pub mod commands;
pub mod logger;

pub use cli::{Cli, Commands};
pub use commands::run;
