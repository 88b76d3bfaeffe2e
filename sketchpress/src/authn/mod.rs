//! Authentication

pub mod session;
