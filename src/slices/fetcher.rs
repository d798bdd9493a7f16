//! Bridges async slice sources into the synchronous session loop.
//!
//! The session orchestrator runs single-threaded and must never block on
//! slice IO. The fetcher spawns one background task that services fetch
//! requests against the source and streams the resulting slice messages
//! back over a channel the orchestrator drains between gestures.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::sources::SliceSource;
use super::types::{FetchEvent, FetchRequest, SliceError};

pub struct SliceFetcher {
    request_tx: mpsc::UnboundedSender<(u64, FetchRequest)>,
    event_rx: mpsc::UnboundedReceiver<FetchEvent>,
}

impl SliceFetcher {
    /// Spawns the background fetch worker on the provided runtime.
    ///
    /// # Arguments
    /// * `runtime_handle` - Tokio runtime handle for spawning the worker
    /// * `source` - Volume the worker fetches from
    pub fn new(runtime_handle: &tokio::runtime::Handle, source: Arc<dyn SliceSource>) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<(u64, FetchRequest)>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<FetchEvent>();

        runtime_handle.spawn(async move {
            while let Some((token, request)) = request_rx.recv().await {
                log::debug!(
                    "fetching slices begin={} count={} reversed={}",
                    request.begin,
                    request.count,
                    request.reversed
                );
                match source.fetch(request).await {
                    Ok(batch) => {
                        for message in batch {
                            let event = FetchEvent {
                                token,
                                outcome: Ok(message),
                            };
                            if event_tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        let event = FetchEvent {
                            token,
                            outcome: Err(err),
                        };
                        if event_tx.send(event).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            request_tx,
            event_rx,
        }
    }

    /// Queues a fetch tagged with the issuing session's token.
    ///
    /// Non-blocking; slices come back through [`SliceFetcher::try_take`].
    pub fn dispatch(&self, token: u64, request: FetchRequest) -> Result<(), SliceError> {
        self.request_tx
            .send((token, request))
            .map_err(|_| SliceError::ChannelClosed)
    }

    /// Next delivery, if one is ready. Never blocks.
    pub fn try_take(&mut self) -> Option<FetchEvent> {
        self.event_rx.try_recv().ok()
    }
}

#[cfg(test)]
impl SliceFetcher {
    pub(crate) fn with_closed_channel_for_test() -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        drop(request_rx);
        let (_event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            request_tx,
            event_rx,
        }
    }
}
