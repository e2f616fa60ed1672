//! CLI command handlers organized by subcommand.
//!
//! | Module | Commands |
//! |--------|----------|
//! | [`datasets`] | `dataset upload`, `dataset get`, `dataset head`, `dataset info` |
//! | [`models`] | `model upload`, `model predict`, `model info`, `model search`, ... |
//! | [`users`] | `user create` |

pub mod credentials;
pub mod datasets;
pub mod models;
pub mod users;
pub mod utils;
