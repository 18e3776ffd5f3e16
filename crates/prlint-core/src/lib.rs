//! Core types, configuration, and error handling for prlint.
//!
//! This crate provides the shared foundation used by the other prlint crates:
//! - [`PrlintError`] — unified error type using `thiserror`
//! - [`PolicyConfig`] / [`TitlePolicy`] — settings from `.prlint.toml` and action inputs
//! - [`EventContext`] — the pull request under test, read from the Actions environment
//! - Shared types: [`PullRequestRef`], [`Review`], [`Comment`], [`NodeRef`],
//!   [`MinimizeReason`], [`MinimizeOutcome`]

pub mod actions;
mod config;
mod error;
mod event;
mod types;

pub use config::{
    env_input, input_env_name, resolve_token, PolicyConfig, TitlePolicy, INPUT_NAMES,
    REGEX_PLACEHOLDER,
};
pub use error::PrlintError;
pub use event::EventContext;
pub use types::{
    Actor, Comment, CommentSource, MinimizeOutcome, MinimizeReason, NodeRef, PullRequestRef,
    Review, ReviewEvent, ReviewState, BOT_LOGIN,
};

/// A convenience `Result` type for prlint operations.
pub type Result<T> = std::result::Result<T, PrlintError>;
