//! Subcommand handlers. Each handler validates its own preconditions and
//! reports user-facing failures as errors for `main` to render.

pub mod history;
pub mod key;
pub mod models;
pub mod query;
