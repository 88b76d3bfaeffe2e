//! Gemini REST wire models used by the sketchpress generator client.

pub mod models;

pub use models::*;
