//! Core engine modules: configuration, data model, pattern store, and the
//! per-contact validator.

pub mod config;
pub mod error;
pub mod inputs;
pub mod models;
pub mod store;
pub mod validator;
