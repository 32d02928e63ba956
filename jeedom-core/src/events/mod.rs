//! Event decoding and application.
//!
//! # Event Flow
//!
//! 1. A raw [`EventBatch`](jeedom_sdk::objects::EventBatch) arrives, pushed
//!    on the socket or returned by a poll.
//! 2. [`decode`] turns it into a [`DecodedBatch`]: the new cursor plus the
//!    ordered deltas, duplicate command updates collapsed.
//! 3. [`BatchApplier`] hands the deltas to the [`EventSink`](crate::EventSink):
//!    all command updates in one call, summary updates one by one.

pub mod apply;
pub mod decoder;
pub mod types;

pub use apply::BatchApplier;
pub use decoder::{decode, decode_text, DecodeError};
pub use types::{CommandUpdate, Cursor, DecodedBatch, DecodedDelta, SummaryUpdate};
