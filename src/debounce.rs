//! Timer-based input coalescing

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

/// Baseline delay; the amount pipeline runs at twice this.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Coalesces a rapidly-changing value: every `push` re-arms the timer, and
/// only the value current once input has been quiet for `delay` is published
/// on the output channel.
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    output: watch::Receiver<Option<T>>,
}

impl<T: Clone + Send + Sync + 'static> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        let (input, mut rx) = mpsc::unbounded_channel::<T>();
        let (tx, output) = watch::channel(None);

        tokio::spawn(async move {
            loop {
                // Wait for the first change, then absorb follow-ups until the
                // input has been quiet for a full delay window.
                let Some(mut pending) = rx.recv().await else {
                    break;
                };
                loop {
                    match timeout(delay, rx.recv()).await {
                        Ok(Some(newer)) => pending = newer,
                        Ok(None) => {
                            let _ = tx.send(Some(pending));
                            return;
                        }
                        Err(_elapsed) => {
                            let _ = tx.send(Some(pending));
                            break;
                        }
                    }
                }
            }
        });

        Self { input, output }
    }

    pub fn push(&self, value: T) {
        let _ = self.input.send(value);
    }

    /// Output channel; holds `None` until the first value settles.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.output.clone()
    }
}
