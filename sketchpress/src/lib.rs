//! sketchpress library
//!
//! Turns a hand-drawn sketch into a hosted static page, then audits the live
//! page and feeds failing findings back to the generator.

pub mod app;
pub mod audit;
pub mod authn;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod generator;
pub mod host;
pub mod http;
pub mod logs;
pub mod models;
pub mod progress;
pub mod repair;
pub mod storage;
pub mod utils;
