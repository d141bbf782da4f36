//! Connect worker client tests against a live cluster
//!
//! These tests need running brokers and Connect workers:
//!
//! ```bash
//! OHARA_IT_WORKERS=localhost:8083 OHARA_IT_BROKERS=localhost:9092 \
//!   cargo test -p ohara-kafka --test worker_client -- --ignored
//! ```
//!
//! They rely on the connectors that ship with the Connect runtime's tools
//! package, so no custom plugin has to be installed on the workers.

use ohara_common::util::{await_condition, await_condition_with, uuid};
use ohara_common::ConnectorState;
use ohara_kafka::{BytesSerializer, Consumer, WorkerClient};
use std::time::Duration;

const VERIFIABLE_SOURCE: &str = "org.apache.kafka.connect.tools.VerifiableSourceConnector";
const MOCK_SOURCE: &str = "org.apache.kafka.connect.tools.MockSourceConnector";

fn workers() -> String {
    std::env::var("OHARA_IT_WORKERS").unwrap_or_else(|_| "localhost:8083".to_string())
}

fn brokers() -> String {
    std::env::var("OHARA_IT_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("ohara_kafka=debug")
        .try_init()
        .ok();
}

async fn create_verifiable_source(client: &WorkerClient, name: &str, topic: &str) {
    client
        .connector_creator()
        .name(name)
        .connector_class(VERIFIABLE_SOURCE)
        .topic(topic)
        .number_of_tasks(1)
        .config("topic", topic)
        .config("throughput", "10")
        .create()
        .await
        .unwrap();
}

async fn await_exist(client: &WorkerClient, name: &str) -> anyhow::Result<()> {
    await_condition(
        move || async move { Ok::<_, anyhow::Error>(client.exist(name).await?) },
        Duration::from_secs(50),
    )
    .await
}

async fn await_state(client: &WorkerClient, name: &str, state: ConnectorState) {
    await_condition_with(
        move || async move {
            Ok::<_, anyhow::Error>(client.status(name).await?.connector.state == state)
        },
        Duration::from_secs(50),
        Duration::from_secs(2),
        true,
    )
    .await
    .unwrap();
}

#[tokio::test]
#[ignore = "requires a running Connect cluster"]
async fn test_exist() {
    init_tracing();
    let client = WorkerClient::new(&workers()).unwrap();
    let name = format!("exist-{}", uuid());
    let topic = format!("exist-topic-{}", uuid());
    assert!(!client.exist(&name).await.unwrap());

    create_verifiable_source(&client, &name, &topic).await;

    let result = await_exist(&client, &name).await;
    client.delete(&name).await.unwrap();
    result.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Connect cluster"]
async fn test_exist_on_unrunnable_connector() {
    init_tracing();
    let client = WorkerClient::new(&workers()).unwrap();
    let name = format!("unrunnable-{}", uuid());
    let topic = format!("unrunnable-topic-{}", uuid());
    assert!(!client.exist(&name).await.unwrap());

    client
        .connector_creator()
        .name(&name)
        .connector_class(MOCK_SOURCE)
        .topic(&topic)
        .number_of_tasks(1)
        .disable_converter()
        .config("mock_mode", "connector-failure")
        .config("delay_ms", "1000")
        .create()
        .await
        .unwrap();

    let result = await_exist(&client, &name).await;
    client.delete(&name).await.unwrap();
    result.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Connect cluster"]
async fn test_pause_and_resume_source() {
    init_tracing();
    let client = WorkerClient::new(&workers()).unwrap();
    let name = format!("pause-{}", uuid());
    let topic = format!("pause-topic-{}", uuid());
    create_verifiable_source(&client, &name, &topic).await;
    await_exist(&client, &name).await.unwrap();

    let consumer = Consumer::builder()
        .topic_name(&topic)
        .offset_from_begin()
        .connection_props(brokers())
        .build(BytesSerializer, BytesSerializer)
        .unwrap();

    // some data arrives while the connector runs
    let records = consumer.poll(Duration::from_secs(10), 1).await.unwrap();
    assert_ne!(records.len(), 0);

    client.pause(&name).await.unwrap();
    await_state(&client, &name, ConnectorState::Paused).await;

    // drain whatever was produced before the pause took effect
    consumer
        .poll(Duration::from_secs(10), usize::MAX)
        .await
        .unwrap();

    let records = consumer.poll(Duration::from_secs(20), 1).await.unwrap();
    assert_eq!(records.len(), 0);

    client.resume(&name).await.unwrap();
    await_state(&client, &name, ConnectorState::Running).await;

    let records = consumer.poll(Duration::from_secs(20), 1).await.unwrap();
    assert_ne!(records.len(), 0);

    client.delete(&name).await.unwrap();
}
