//! jot-core - Core library for Jot
//!
//! This crate contains the shared models, remote note store client, and the
//! note synchronization logic used by the Jot front ends.

pub mod auth;
pub mod config;
pub mod error;
mod http;
pub mod models;
pub mod remote;
pub mod session;
pub mod sync;

pub use error::{Error, Result};
pub use models::{Note, NoteColor};
