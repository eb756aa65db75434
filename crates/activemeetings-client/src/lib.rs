//! Command-line host for the active-meetings view.
//!
//! This crate provides the `activemeetings` binary: it feeds presence
//! events from a file or stdin into a session, renders rows to the
//! terminal and keeps the membership store in a JSON file.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod store;
pub mod terminal;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use store::FileStore;
pub use terminal::TerminalPresenter;
