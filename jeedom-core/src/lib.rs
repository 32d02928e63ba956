#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod connectivity;
pub mod events;
pub mod listener;
pub mod sink;
pub mod transport;

pub use config::{JeedomConfig, ListenerConfig};
pub use connectivity::{AlwaysOnline, ConnectivityGate, NetworkStatus};
pub use events::{CommandUpdate, Cursor, DecodedBatch, DecodedDelta, SummaryUpdate};
pub use listener::{DeliveryMode, EventListener, ListenerError};
pub use sink::{EventSink, MemoryStore};
pub use transport::RpcTransport;
