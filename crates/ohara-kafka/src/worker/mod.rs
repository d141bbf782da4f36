//! REST client for Kafka Connect workers.
//!
//! Every operation maps to a single call on the worker's REST interface:
//!
//! | operation | request |
//! |-----------|---------|
//! | create | `POST /connectors` |
//! | delete | `DELETE /connectors/{name}` |
//! | exist / active connectors | `GET /connectors` |
//! | pause | `PUT /connectors/{name}/pause` |
//! | resume | `PUT /connectors/{name}/resume` |
//! | status | `GET /connectors/{name}/status` |
//! | config | `GET /connectors/{name}/config` |
//! | plugins | `GET /connector-plugins` |

pub mod client;
pub mod creator;
pub mod model;

pub use client::WorkerClient;
pub use creator::{ConnectorCreator, BYTE_ARRAY_CONVERTER};
pub use model::{ConnectorInfo, ConnectorStateInfo, ConnectorStatus, Plugin, TaskId, TaskStatus};
