//! Contract/License import library
//!
//! Rebuilds the Contract -> License hierarchy from a flat backup extract
//! and writes it into a CMDB-shaped store. This module exports the core
//! components for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod import;
pub mod logging;
pub mod types;
