//! Shared utility modules.

pub mod domain;
pub mod patterns;
