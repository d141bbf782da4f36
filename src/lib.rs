//! ohara command-line library
//!
//! Drives Kafka Connect workers, topics and stream applications from the
//! command line, on top of the `ohara-kafka` and `ohara-streams` crates.
//!
//! # CLI Usage
//!
//! ```bash
//! # Deploy a connector on a worker cluster
//! ohara connector create --workers localhost:8083 \
//!   --name perf --class com.example.PerfSource --topics perf-topic
//!
//! # Pause it and wait until every task is paused
//! ohara connector pause perf
//! ohara connector await perf --state PAUSED --timeout 1m
//!
//! # Read what landed on a topic
//! ohara consume --brokers localhost:9092 --topic perf-topic --expected 10
//!
//! # Copy one topic into another until interrupted
//! ohara stream run --from-topic perf-topic --to-topic perf-copy
//! ```

use clap::Parser;

pub mod config;
pub mod connector;
pub mod consume;
pub mod stream;
pub mod topic;

#[derive(Parser, Clone, Debug)]
pub struct WorkerOpts {
    /// Connect workers, as host:port[,host:port...]
    #[arg(long, default_value = "localhost:8083", env = "OHARA_WORKERS")]
    pub workers: String,
}

#[derive(Parser, Clone, Debug)]
pub struct BrokerOpts {
    /// Kafka bootstrap servers
    #[arg(long, default_value = "localhost:9092", env = "OHARA_BROKERS")]
    pub brokers: String,
}
