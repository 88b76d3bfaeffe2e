//! GitHub REST wire models used by the sketchpress host client.

pub mod models;

pub use models::*;
