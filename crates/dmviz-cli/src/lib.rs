//! # dmviz CLI
//!
//! Command line front end for dmviz. One invocation loads the snapshot
//! files a chart needs, applies the control flags on top of the configured
//! defaults and prints the derived view as JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod args;
pub mod error;

pub use app::*;
pub use args::*;
pub use error::*;
