//! Shared domain types for the VidNova generation backend.

pub mod error;
pub mod generation;
pub mod mentions;
pub mod types;
