//! Application layer

pub mod options;
pub mod workbench;
