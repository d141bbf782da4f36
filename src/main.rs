//! Command-line interface for ohara
//!
//! # Usage Examples
//!
//! ## Connectors
//! ```bash
//! # Deploy a connector with raw byte converters
//! ohara connector create --workers w1:8083,w2:8083 \
//!   --name copy --class com.example.RowSink \
//!   --topics in-topic --tasks 2 --disable-converter \
//!   --config output=out-topic
//!
//! # Inspect and control it
//! ohara connector status copy
//! ohara connector pause copy
//! ohara connector await copy --state PAUSED
//! ```
//!
//! ## Topics and streams
//! ```bash
//! ohara topic create events --partitions 3 --brokers localhost:9092
//! ohara consume --topic events --timeout 30s --expected 100
//! ohara stream run --from-topic events --to-topic events-copy --duration 10m
//! ```
//!
//! `--workers` and `--brokers` fall back to `OHARA_WORKERS` and `OHARA_BROKERS`.

use clap::{Parser, Subcommand};
use ohara::connector::ConnectorCommand;
use ohara::consume::ConsumeArgs;
use ohara::stream::StreamCommand;
use ohara::topic::TopicCommand;
use ohara::{BrokerOpts, WorkerOpts};

#[derive(Parser, Debug)]
#[command(name = "ohara")]
#[command(about = "Manage Kafka Connect connectors, topics and stream applications")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage connectors through the Connect worker REST API
    Connector {
        #[command(flatten)]
        worker_opts: WorkerOpts,

        #[command(subcommand)]
        command: ConnectorCommand,
    },

    /// Manage topics
    Topic {
        #[command(flatten)]
        broker_opts: BrokerOpts,

        #[command(subcommand)]
        command: TopicCommand,
    },

    /// Read records from a topic
    Consume(ConsumeArgs),

    /// Run stream applications
    Stream {
        #[command(subcommand)]
        command: StreamCommand,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Connector {
            worker_opts,
            command,
        } => ohara::connector::run(worker_opts, command).await,
        Commands::Topic {
            broker_opts,
            command,
        } => ohara::topic::run(broker_opts, command).await,
        Commands::Consume(args) => ohara::consume::run(args).await,
        Commands::Stream { command } => ohara::stream::run(command).await,
    }
}
