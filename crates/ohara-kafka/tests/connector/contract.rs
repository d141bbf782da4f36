use crate::fixtures::{dumb_columns, DumbSource, SimpleRowSinkConnector, BROKER, OUTPUT};
use ohara_common::{Column, COLUMN_KEY};
use ohara_kafka::connector::{
    RowSinkConnector, RowSinkTask, RowSourceConnector, RowSourceTask, TaskConfig,
};
use ohara_kafka::Error;

fn sink_config() -> TaskConfig {
    TaskConfig::builder()
        .name("sink")
        .topic("input")
        .option(OUTPUT, "output-topic")
        .option(BROKER, "localhost:9092")
        .build()
        .unwrap()
}

#[test]
fn test_dumb_source_task_configs() {
    let source = DumbSource::default();
    let configs = source.task_configs(5).unwrap();
    assert_eq!(configs.len(), 1);

    let config = &configs[0];
    assert_eq!(config.name(), "test");
    assert_eq!(config.topics(), &["topic".to_string()]);
    assert_eq!(config.schema(), dumb_columns().as_slice());

    let declared = config.option(COLUMN_KEY).unwrap();
    assert_eq!(Column::to_columns(declared).unwrap(), dumb_columns());
    let props = config.to_props();
    assert_eq!(Column::to_columns(&props[COLUMN_KEY]).unwrap(), dumb_columns());
}

#[test]
fn test_dumb_source_config_survives_props() {
    let source = DumbSource::default();
    let config = source.task_configs(1).unwrap().remove(0);
    assert_eq!(TaskConfig::from_props(&config.to_props()).unwrap(), config);
}

#[tokio::test]
async fn test_dumb_source_task_polls_nothing() {
    let mut source = DumbSource::default();
    let config = source.task_configs(1).unwrap().remove(0);
    source.start(config.clone()).unwrap();

    let mut task = source.create_task();
    task.start(config).await.unwrap();
    assert!(task.poll().await.unwrap().is_empty());
    task.stop().await.unwrap();
    source.stop().unwrap();
}

#[test]
fn test_simple_sink_checks_options() {
    let mut sink = SimpleRowSinkConnector::default();
    let missing = TaskConfig::builder()
        .name("sink")
        .topic("input")
        .option(OUTPUT, "output-topic")
        .build()
        .unwrap();
    let err = sink.start(missing).unwrap_err();
    assert!(matches!(err, Error::Connector(msg) if msg.contains(BROKER)));

    sink.start(sink_config()).unwrap();
}

#[test]
fn test_simple_sink_hands_out_copies() {
    let mut sink = SimpleRowSinkConnector::default();
    assert!(sink.task_configs(2).is_err());

    sink.start(sink_config()).unwrap();
    let configs = sink.task_configs(3).unwrap();
    assert_eq!(configs.len(), 3);
    assert!(configs.iter().all(|c| *c == sink_config()));
    assert!(!sink.version().is_empty());
}

#[tokio::test]
async fn test_simple_sink_task_lifecycle() {
    let sink = SimpleRowSinkConnector::default();
    let mut task = sink.create_task();

    let err = task.put(Vec::new()).await.unwrap_err();
    assert!(matches!(err, Error::Connector(_)));

    task.start(sink_config()).await.unwrap();
    task.put(Vec::new()).await.unwrap();
    task.stop().await.unwrap();
}
