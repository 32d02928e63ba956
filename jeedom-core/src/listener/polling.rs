//! Continuous polling fallback.
//!
//! One task per polling run: poll, sleep `read_delay`, poll again. A
//! failed call ends the chain; it has to be restarted from outside.

use tracing::{debug, info};

use super::{EventListener, ListenerError};

pub(crate) async fn run(listener: EventListener, generation: u64) {
    let read_delay = listener.config().read_delay;
    info!(?read_delay, "Polling events");

    loop {
        match listener.poll_once().await {
            Ok(applied) => debug!(applied, "Polled events"),
            Err(ListenerError::Poll(_)) => break,
        }
        tokio::time::sleep(read_delay).await;
    }

    info!("Polling stopped");
    listener.polling_stopped(generation);
}
