use crate::config::parse_duration;
use crate::BrokerOpts;
use anyhow::Context;
use clap::Subcommand;
use ohara_streams::{OStreamBuilder, Serdes, WallclockTimestampExtractor};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Subcommand, Debug, Clone)]
pub enum StreamCommand {
    /// Copy records from one topic to another
    Run {
        #[command(flatten)]
        broker_opts: BrokerOpts,

        #[arg(long)]
        from_topic: String,

        #[arg(long)]
        to_topic: String,

        /// Application id (random when omitted)
        #[arg(long)]
        app_id: Option<String>,

        /// Forget the progress of a previous run with the same application id
        #[arg(long)]
        clean_start: bool,

        /// Stamp output records with the local clock instead of the source timestamp
        #[arg(long)]
        wallclock: bool,

        /// Stop after this long instead of waiting for Ctrl-C
        #[arg(long, value_parser = parse_duration)]
        duration: Option<Duration>,
    },
}

pub async fn run(command: StreamCommand) -> anyhow::Result<()> {
    let StreamCommand::Run {
        broker_opts,
        from_topic,
        to_topic,
        app_id,
        clean_start,
        wallclock,
        duration,
    } = command;

    let mut builder = OStreamBuilder::<String, String>::new(Serdes::string(), Serdes::string())
        .bootstrap_servers(broker_opts.brokers)
        .from_topic(from_topic)
        .to_topic(to_topic);
    if let Some(app_id) = app_id {
        builder = builder.app_id(app_id);
    }
    if clean_start {
        builder = builder.clean_start();
    }
    if wallclock {
        builder = builder.timestamp_extractor(WallclockTimestampExtractor);
    }

    let stream = builder.build()?;
    let config = stream.config().clone();
    let running = stream
        .start()
        .await
        .with_context(|| format!("Failed to start stream {}", config.app_id))?;
    info!(
        "Stream {} running: {} -> {}",
        config.app_id, config.from_topic, config.to_topic
    );

    tokio::select! {
        _ = stop_requested(duration) => {}
        _ = running.finished() => warn!("Stream {} ended early", config.app_id),
    }

    let stats = running
        .stop()
        .await
        .with_context(|| format!("Stream {} failed", config.app_id))?;
    info!(
        "Stream {} stopped: {} consumed, {} produced, {} filtered",
        config.app_id, stats.consumed, stats.produced, stats.filtered
    );
    Ok(())
}

/// Resolves after `duration`, or on Ctrl-C when there is none.
async fn stop_requested(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
}
