//! SQLite backends for the Accolade stores.
//!
//! Two independent databases, each wrapped in [`tokio_rusqlite`] so all
//! access runs on a dedicated thread without blocking the async runtime:
//!
//! - [`SqliteStore`]: the relational database holding reference rows, plus
//!   the directory tables (roles, users, students, advisors) that reference
//!   listings join against.
//! - [`DocumentStore`]: achievement content as JSON documents.

mod content;
mod directory;
mod encode;
mod schema;
mod store;

pub mod error;

pub use content::DocumentStore;
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
