use crate::config::parse_duration;
use crate::BrokerOpts;
use clap::Parser;
use ohara_kafka::{Consumer, StringSerializer};
use std::time::Duration;
use tracing::info;

/// Print records of a topic as `key<TAB>value` lines.
#[derive(Parser, Debug, Clone)]
pub struct ConsumeArgs {
    #[command(flatten)]
    pub broker_opts: BrokerOpts,

    /// Topic to read
    #[arg(long)]
    pub topic: String,

    /// Consumer group (random when omitted)
    #[arg(long)]
    pub group_id: Option<String>,

    /// Stop waiting after this long
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Stop as soon as this many records arrived
    #[arg(long, default_value_t = 1)]
    pub expected: usize,

    /// Skip records published before the consumer joined
    #[arg(long)]
    pub latest: bool,
}

pub async fn run(args: ConsumeArgs) -> anyhow::Result<()> {
    let mut builder = Consumer::builder()
        .connection_props(&args.broker_opts.brokers)
        .topic_name(&args.topic);
    if let Some(group_id) = &args.group_id {
        builder = builder.group_id(group_id);
    }
    builder = if args.latest {
        builder.offset_after_latest()
    } else {
        builder.offset_from_begin()
    };
    let consumer = builder.build(StringSerializer, StringSerializer)?;

    let records = consumer.poll(args.timeout, args.expected).await?;
    for record in &records {
        println!(
            "{}\t{}",
            record.key.as_deref().unwrap_or_default(),
            record.value.as_deref().unwrap_or_default()
        );
    }
    if args.group_id.is_some() {
        consumer.commit_records(&records)?;
    }

    info!("Received {} of {} expected records", records.len(), args.expected);
    if records.len() < args.expected {
        anyhow::bail!(
            "Timed out after {:?} with {} of {} records from {}",
            args.timeout,
            records.len(),
            args.expected,
            args.topic
        );
    }
    Ok(())
}
