//! Stream tests against a live broker
//!
//! ```bash
//! OHARA_IT_BROKERS=localhost:9092 cargo test -p ohara-streams --test stream -- --ignored
//! ```

use ohara_common::util::uuid;
use ohara_kafka::{Consumer, Producer, StringSerializer, TopicAdmin};
use ohara_streams::{OStreamBuilder, Serdes, StreamStats};
use std::time::Duration;

fn brokers() -> String {
    std::env::var("OHARA_IT_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("ohara_streams=debug,ohara_kafka=debug")
        .try_init()
        .ok();
}

#[tokio::test]
#[ignore = "requires a running broker"]
async fn test_uppercase_stream() -> anyhow::Result<()> {
    init_tracing();
    let brokers = brokers();
    let from_topic = format!("from-{}", uuid());
    let to_topic = format!("to-{}", uuid());

    let admin = TopicAdmin::new(&brokers)?;
    admin.create_topic(&from_topic, 1, 1).await?;
    admin.create_topic(&to_topic, 1, 1).await?;

    let producer = Producer::builder()
        .connection_props(&brokers)
        .build(StringSerializer, StringSerializer)?;
    for value in ["apple", "banana", "avocado"] {
        producer
            .sender()
            .key(value.to_string())
            .value(value.to_string())
            .send(&from_topic)
            .await?;
    }

    let running = OStreamBuilder::<String, String>::new(Serdes::string(), Serdes::string())
        .bootstrap_servers(&brokers)
        .from_topic(&from_topic)
        .to_topic(&to_topic)
        .clean_start()
        .build()?
        .filter(|_, value| value.is_some_and(|v| v.starts_with('a')))
        .map_values(|v| v.to_uppercase())
        .start()
        .await?;

    let consumer = Consumer::builder()
        .connection_props(&brokers)
        .topic_name(&to_topic)
        .offset_from_begin()
        .build(StringSerializer, StringSerializer)?;
    let records = consumer.poll(Duration::from_secs(30), 2).await?;

    let stats = running.stop().await?;
    assert_eq!(
        stats,
        StreamStats {
            consumed: 3,
            produced: 2,
            filtered: 1,
        }
    );

    let mut values: Vec<_> = records.into_iter().filter_map(|r| r.value).collect();
    values.sort();
    assert_eq!(values, vec!["APPLE".to_string(), "AVOCADO".to_string()]);

    admin.delete_topic(&from_topic).await?;
    admin.delete_topic(&to_topic).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running broker"]
async fn test_stop_before_any_record() -> anyhow::Result<()> {
    init_tracing();
    let brokers = brokers();
    let topic = format!("idle-{}", uuid());
    let admin = TopicAdmin::new(&brokers)?;
    admin.create_topic(&topic, 1, 1).await?;

    let running = OStreamBuilder::<String, String>::new(Serdes::string(), Serdes::string())
        .bootstrap_servers(&brokers)
        .from_topic(&topic)
        .to_topic(format!("{topic}-out"))
        .build()?
        .start()
        .await?;
    assert!(running.app_id().ends_with("-streamApp"));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(running.stop().await?, StreamStats::default());

    admin.delete_topic(&topic).await?;
    Ok(())
}
