//! # dmviz Graphs
//!
//! Snapshot loading, range aggregation and chart view derivation for the
//! direct message visualisation.
//!
//! Data flows one way: a [`SnapshotLoader`] fetches the generated files into
//! a [`Snapshot`], the [`RangeAggregator`] restricts and ranks the count
//! tables, and the [`GraphManager`] turns the snapshot plus the current
//! [`Controls`] and [`ViewState`] into a serializable [`DerivedView`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod data_fetcher;
pub mod datasets;
pub mod manager;
pub mod stack;
pub mod table;
pub mod traits;
pub mod view_state;

// Chart views
pub mod bar_race;
pub mod bump_chart;
pub mod day_hour;
pub mod heatmap;
pub mod line_chart;
pub mod response_times;
pub mod sent_received;
pub mod stream_graph;

pub use aggregator::*;
pub use data_fetcher::*;
pub use datasets::*;
pub use manager::*;
pub use stack::*;
pub use table::*;
pub use traits::*;
pub use view_state::*;
