//! # MenuLens Common Library
//!
//! Shared code for MenuLens services:
//! - Error types and result alias
//! - Data directory and configuration file resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
