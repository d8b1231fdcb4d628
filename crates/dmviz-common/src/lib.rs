//! # dmviz Common
//!
//! Shared types, utilities, and common functionality for dmviz.
//!
//! This crate provides the error type, logging setup, and the period and
//! control vocabulary used across all other crates in the workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod period;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{DmVizError, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use period::{DateRange, Granularity, Period};
pub use types::*;
pub use utils::*;
