use crate::BrokerOpts;
use anyhow::Context;
use clap::Subcommand;
use ohara_kafka::TopicAdmin;
use tracing::info;

#[derive(Subcommand, Debug, Clone)]
pub enum TopicCommand {
    /// Create a topic; an existing topic is left as is
    Create {
        name: String,

        #[arg(long, default_value_t = 1)]
        partitions: i32,

        #[arg(long, default_value_t = 1)]
        replication: i32,
    },
    /// Delete a topic
    Delete { name: String },
    /// List topics, internal ones excluded
    List,
}

pub async fn run(opts: BrokerOpts, command: TopicCommand) -> anyhow::Result<()> {
    let admin = TopicAdmin::new(&opts.brokers)
        .with_context(|| format!("Failed to connect to {}", opts.brokers))?;

    match command {
        TopicCommand::Create {
            name,
            partitions,
            replication,
        } => {
            admin
                .create_topic(&name, partitions, replication)
                .await
                .with_context(|| format!("Failed to create topic {name}"))?;
            info!("Topic {name} is ready ({partitions} partitions, replication {replication})");
        }
        TopicCommand::Delete { name } => {
            admin
                .delete_topic(&name)
                .await
                .with_context(|| format!("Failed to delete topic {name}"))?;
            info!("Deleted topic {name}");
        }
        TopicCommand::List => {
            for topic in admin.list_topics().await? {
                println!("{topic}");
            }
        }
    }
    Ok(())
}
