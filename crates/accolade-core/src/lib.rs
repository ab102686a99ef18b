//! Core types and trait definitions for the Accolade achievement pipeline.
//!
//! This crate has no HTTP or database dependencies. It defines the two
//! stores an achievement lives in (bulky content in a document store,
//! authoritative workflow state in a relational reference store), the
//! read-only directory collaborators, and the [`Lifecycle`] coordinator that
//! sequences them.

// Trait declarations spell out `Send` futures; impls use plain `async fn`.
#![allow(async_fn_in_trait)]

mod deadline;

pub mod achievement;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod reference;
pub mod scope;
pub mod store;

pub use error::{Error, Result};
pub use lifecycle::{Created, Lifecycle, LifecycleConfig};
