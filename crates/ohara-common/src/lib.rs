//! Core types shared by the ohara crates.
//!
//! This crate provides the foundational pieces used by the Kafka and Streams
//! layers:
//!
//! - [`Row`], [`Cell`] and [`Value`] - the record payload exchanged by connectors
//! - [`Column`] and [`DataType`] - schema entries carried in connector options
//! - [`ConnectorState`] - connector/task states reported by a Connect worker
//! - [`util`] - identifiers and polling helpers
//!
//! # Example
//!
//! ```rust
//! use ohara_common::{Cell, Row, Value};
//!
//! let row = Row::of(vec![Cell::of("f0", 13), Cell::of("f1", false)]);
//! assert_eq!(row.size(), 2);
//! assert_eq!(row.cell_by_name("f0").map(|c| &c.value), Some(&Value::Int(13)));
//! ```

pub mod error;
pub mod schema;
pub mod types;
pub mod util;
pub mod values;

pub use error::{Error, Result};
pub use schema::{Column, COLUMN_KEY};
pub use types::{ConnectorState, DataType};
pub use values::{Cell, Row, Value};
