//! Row connector contract tests
//!
//! Exercises the connector traits through two small fixtures: a source that
//! never produces anything and a sink that forwards rows to another topic.

mod contract;
mod fixtures;
