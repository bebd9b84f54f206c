//! Infrastructure layer: config, logging, storage paths, and secrets.

pub mod config;
pub mod contracts;
pub mod error;
pub mod logging;
pub mod secrets;
pub mod storage_layout;
