//! Topic-to-topic stream applications.
//!
//! [`OStreamBuilder`] wires a source topic, a destination topic and their
//! serdes into an [`OStream`]; [`OStream::start`] runs it on the tokio runtime.
//!
//! ```no_run
//! use ohara_streams::{OStreamBuilder, Serdes};
//!
//! # async fn run() -> ohara_streams::Result<()> {
//! let running = OStreamBuilder::new(Serdes::string(), Serdes::string())
//!     .bootstrap_servers("localhost:9092")
//!     .from_topic("input")
//!     .to_topic("output")
//!     .build()?
//!     .map_values(|v: String| v.to_uppercase())
//!     .start()
//!     .await?;
//! let stats = running.stop().await?;
//! println!("{} records written", stats.produced);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod extractor;
pub mod ostream;
pub mod serdes;

pub use builder::{OStreamBuilder, APP_ID_SUFFIX};
pub use error::{Error, Result};
pub use extractor::{RecordTimestampExtractor, TimestampExtractor, WallclockTimestampExtractor};
pub use ostream::{OStream, RunningStream, StreamConfig, StreamStats};
pub use serdes::{
    BytesSerde, CodecDeserializer, CodecSerde, CodecSerializer, Configs, Consumed, Deserializer,
    DoubleSerde, IntSerde, LongSerde, Produced, RowSerde, Serde, SerdeClone, Serdes, Serializer,
    StringSerde, WrapperSerde,
};
