//! Hand decoded deltas over to the [`EventSink`].

use std::convert::Infallible;
use std::sync::Arc;

use kanau::processor::Processor;

use super::types::{DecodedBatch, DecodedDelta};
use crate::sink::EventSink;

/// Applies a [`DecodedBatch`] to the sink.
///
/// All command updates of the batch go out in a single
/// `apply_command_updates` call so the sink can apply them atomically;
/// that call is skipped when there are none. Summary updates are applied
/// one at a time.
#[derive(Clone)]
pub struct BatchApplier {
    sink: Arc<dyn EventSink>,
}

impl BatchApplier {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }
}

impl Processor<DecodedBatch> for BatchApplier {
    /// Number of deltas applied.
    type Output = usize;
    type Error = Infallible;

    async fn process(&self, batch: DecodedBatch) -> Result<usize, Infallible> {
        let (cursor, deltas) = batch.into_parts();
        let applied = deltas.len();
        let mut command_updates = Vec::new();

        for delta in deltas {
            match delta {
                DecodedDelta::ValueUpdate(update) => command_updates.push(update),
                DecodedDelta::SummaryUpdate(update) => {
                    self.sink
                        .apply_object_summary_update(&update.object_id, &update.key, &update.value);
                }
            }
        }
        if !command_updates.is_empty() {
            self.sink.apply_command_updates(command_updates);
        }

        tracing::debug!(%cursor, applied, "Applied event batch");
        Ok(applied)
    }
}
