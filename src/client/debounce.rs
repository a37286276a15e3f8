use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::FilterSelection;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Coalesces bursts of selection changes.
///
/// A selection is forwarded once no newer one has arrived for `delay`; every
/// arrival restarts the wait, and only the latest selection of a burst is
/// emitted. Pending input is flushed when the sender side is dropped.
pub struct SelectionDebouncer {
    input: mpsc::UnboundedSender<FilterSelection>,
    task: JoinHandle<()>,
}

impl SelectionDebouncer {
    pub fn spawn(delay: Duration) -> (Self, mpsc::Receiver<FilterSelection>) {
        let (input, mut rx) = mpsc::unbounded_channel::<FilterSelection>();
        let (out_tx, out_rx) = mpsc::channel::<FilterSelection>(1);

        let task = tokio::spawn(async move {
            while let Some(mut latest) = rx.recv().await {
                let mut coalesced = 0usize;
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(selection) => {
                                latest = selection;
                                coalesced += 1;
                            }
                            None => {
                                let _ = out_tx.send(latest).await;
                                return;
                            }
                        },
                        _ = tokio::time::sleep(delay) => break,
                    }
                }
                debug!("Emitting selection after coalescing {} updates", coalesced);
                if out_tx.send(latest).await.is_err() {
                    return;
                }
            }
        });

        (Self { input, task }, out_rx)
    }

    pub fn push(&self, selection: FilterSelection) {
        let _ = self.input.send(selection);
    }

    /// Stops accepting input and waits for the pending selection to flush.
    pub async fn close(self) {
        drop(self.input);
        let _ = self.task.await;
    }
}
