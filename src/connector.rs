use crate::config::parse_duration;
use crate::WorkerOpts;
use anyhow::Context;
use clap::Subcommand;
use ohara_common::util::await_condition_with;
use ohara_common::{Column, ConnectorState};
use ohara_kafka::WorkerClient;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

#[derive(Subcommand, Debug, Clone)]
pub enum ConnectorCommand {
    /// Deploy a connector
    Create {
        /// Connector name (random when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Connector class installed on the workers
        #[arg(long = "class")]
        class: String,

        /// Topics the connector reads or writes
        #[arg(long, value_delimiter = ',', required = true)]
        topics: Vec<String>,

        /// Maximum number of tasks
        #[arg(long, default_value_t = 1)]
        tasks: u32,

        /// Use the byte-array converter for keys and values
        #[arg(long)]
        disable_converter: bool,

        /// Column definitions as a JSON array
        #[arg(long)]
        columns: Option<String>,

        /// Extra connector setting (format: key=value)
        #[arg(long = "config", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        configs: Vec<(String, String)>,
    },
    /// Delete a connector
    Delete { name: String },
    /// Pause a connector
    Pause { name: String },
    /// Resume a paused connector
    Resume { name: String },
    /// Print the status of a connector and its tasks
    Status { name: String },
    /// Print the configuration of a connector
    Config { name: String },
    /// Exit successfully only if the connector exists
    Exist { name: String },
    /// List connectors deployed on the workers
    List,
    /// List connector classes installed on the workers
    Plugins,
    /// Wait until a connector and all its tasks reach a state
    Await {
        name: String,

        #[arg(long, default_value = "RUNNING")]
        state: ConnectorState,

        #[arg(long, default_value = "50s", value_parser = parse_duration)]
        timeout: Duration,

        #[arg(long, default_value = "1s", value_parser = parse_duration)]
        interval: Duration,
    },
}

fn parse_key_value(s: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .with_context(|| format!("Expected key=value, got: {s}"))?;
    if key.trim().is_empty() {
        anyhow::bail!("Empty key in: {s}");
    }
    Ok((key.trim().to_string(), value.to_string()))
}

pub async fn run(opts: WorkerOpts, command: ConnectorCommand) -> anyhow::Result<()> {
    let client = WorkerClient::new(&opts.workers)
        .with_context(|| format!("Invalid worker list: {}", opts.workers))?;

    match command {
        ConnectorCommand::Create {
            name,
            class,
            topics,
            tasks,
            disable_converter,
            columns,
            configs,
        } => {
            let mut creator = client
                .connector_creator()
                .connector_class(class)
                .topics(topics)
                .number_of_tasks(tasks)
                .configs(configs.into_iter().collect::<BTreeMap<_, _>>());
            if let Some(name) = name {
                creator = creator.name(name);
            }
            if disable_converter {
                creator = creator.disable_converter();
            }
            if let Some(columns) = columns {
                let columns = Column::to_columns(&columns).context("Invalid column definitions")?;
                creator = creator.columns(columns);
            }
            let info = creator.create().await.context("Failed to create connector")?;
            info!("Created connector {}", info.name);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        ConnectorCommand::Delete { name } => {
            client.delete(&name).await?;
            info!("Deleted connector {name}");
        }
        ConnectorCommand::Pause { name } => {
            client.pause(&name).await?;
            info!("Paused connector {name}");
        }
        ConnectorCommand::Resume { name } => {
            client.resume(&name).await?;
            info!("Resumed connector {name}");
        }
        ConnectorCommand::Status { name } => {
            let status = client.status(&name).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        ConnectorCommand::Config { name } => {
            let config = client.config(&name).await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConnectorCommand::Exist { name } => {
            if !client.exist(&name).await? {
                anyhow::bail!("Connector {name} does not exist");
            }
            println!("{name}");
        }
        ConnectorCommand::List => {
            for name in client.active_connectors().await? {
                println!("{name}");
            }
        }
        ConnectorCommand::Plugins => {
            let plugins = client.plugins().await?;
            println!("{}", serde_json::to_string_pretty(&plugins)?);
        }
        ConnectorCommand::Await {
            name,
            state,
            timeout,
            interval,
        } => {
            let client = &client;
            let connector = name.as_str();
            await_condition_with(
                move || async move {
                    let status = client.status(connector).await?;
                    Ok::<_, anyhow::Error>(
                        status.connector.state == state
                            && status.tasks.iter().all(|task| task.state == state),
                    )
                },
                timeout,
                interval,
                true,
            )
            .await
            .with_context(|| format!("Connector {name} did not reach {state}"))?;
            info!("Connector {name} is {state}");
        }
    }
    Ok(())
}
