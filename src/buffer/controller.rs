use std::time::Duration;

use tokio::{
    select,
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, error, info};

use super::{Batch, BatchBuffer, FlushTrigger};
use crate::core::{NewsItem, SfError};

/// Sizing and timing for the flush controller.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Flush as soon as this many items are buffered. Default: 10.
    pub batch_size: usize,
    /// Flush whatever is buffered this often. Default: 5s.
    pub flush_interval: Duration,
    /// Capacity of the inbound command queue. Default: 1024.
    pub queue_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_interval: Duration::from_secs(5),
            queue_capacity: 1024,
        }
    }
}

enum Command {
    Append(NewsItem),
    Flush(oneshot::Sender<usize>),
}

/// Producer side of the buffer. Cheap to clone; one per poller is fine.
#[derive(Clone)]
pub struct BufferHandle {
    tx: mpsc::Sender<Command>,
}

impl BufferHandle {
    /// Queue an item for the next batch.
    ///
    /// Only waits when the inbound queue is full, never on a gateway call.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Closed` if the controller has stopped.
    pub async fn append(&self, item: NewsItem) -> Result<(), SfError> {
        self.tx
            .send(Command::Append(item))
            .await
            .map_err(|_| SfError::Closed)
    }

    /// Detach whatever is buffered right now. Returns the number of items flushed.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Closed` if the controller has stopped.
    pub async fn flush(&self) -> Result<usize, SfError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply_tx))
            .await
            .map_err(|_| SfError::Closed)?;
        reply_rx.await.map_err(|_| SfError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Owns the buffer task. Dropping it stops the task after a final flush.
pub struct FlushController {
    join: JoinHandle<()>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl FlushController {
    /// Start the controller. Detached batches are sent, in order, on `out`.
    pub fn spawn(cfg: BufferConfig, out: mpsc::Sender<Batch>) -> (Self, BufferHandle) {
        let (tx, mut rx) = mpsc::channel::<Command>(cfg.queue_capacity.max(1));
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        info!(
            batch_size = cfg.batch_size,
            flush_interval_ms = u64::try_from(cfg.flush_interval.as_millis()).unwrap_or(u64::MAX),
            "flush controller started"
        );

        let join = tokio::spawn(async move {
            let mut buffer = BatchBuffer::new(cfg.batch_size);
            let mut seq: u64 = 0;
            let period = cfg.flush_interval.max(Duration::from_millis(1));
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                select! {
                    cmd = rx.recv() => match cmd {
                        Some(Command::Append(item)) => {
                            if let Some(items) = buffer.append(item)
                                && !emit(&out, &mut seq, FlushTrigger::Size, items).await
                            {
                                break;
                            }
                        }
                        Some(Command::Flush(reply)) => {
                            let (n, alive) = match buffer.flush() {
                                Some(items) => {
                                    let n = items.len();
                                    (n, emit(&out, &mut seq, FlushTrigger::Manual, items).await)
                                }
                                None => (0, true),
                            };
                            let _ = reply.send(n);
                            if !alive {
                                break;
                            }
                        }
                        None => {
                            // every producer is gone
                            if let Some(items) = buffer.flush() {
                                emit(&out, &mut seq, FlushTrigger::Shutdown, items).await;
                            }
                            break;
                        }
                    },
                    _ = ticker.tick() => {
                        if let Some(items) = buffer.flush()
                            && !emit(&out, &mut seq, FlushTrigger::Timer, items).await
                        {
                            break;
                        }
                    }
                    _ = &mut stop_rx => {
                        rx.close();
                        while let Ok(cmd) = rx.try_recv() {
                            match cmd {
                                Command::Append(item) => {
                                    if let Some(items) = buffer.append(item) {
                                        emit(&out, &mut seq, FlushTrigger::Shutdown, items).await;
                                    }
                                }
                                Command::Flush(reply) => {
                                    let n = match buffer.flush() {
                                        Some(items) => {
                                            let n = items.len();
                                            emit(&out, &mut seq, FlushTrigger::Shutdown, items).await;
                                            n
                                        }
                                        None => 0,
                                    };
                                    let _ = reply.send(n);
                                }
                            }
                        }
                        if let Some(items) = buffer.flush() {
                            emit(&out, &mut seq, FlushTrigger::Shutdown, items).await;
                        }
                        break;
                    }
                }
            }
            debug!(batches = seq, "flush controller exited");
        });

        (
            Self {
                join,
                stop_tx: Some(stop_tx),
            },
            BufferHandle { tx },
        )
    }

    /// Flush what is left, then wait for the task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.join).await;
    }

    /// Immediately abort the task; buffered items are lost.
    pub fn abort(self) {
        self.join.abort();
    }
}

/// Hand a detached batch to the dispatcher. `false` once nobody is listening.
async fn emit(
    out: &mpsc::Sender<Batch>,
    seq: &mut u64,
    trigger: FlushTrigger,
    items: Vec<NewsItem>,
) -> bool {
    *seq += 1;
    let size = items.len();
    debug!(seq = *seq, trigger = trigger.as_str(), size, "buffer flushed");

    let batch = Batch {
        seq: *seq,
        trigger,
        items,
    };
    if out.send(batch).await.is_err() {
        error!(seq = *seq, size, "dispatcher gone; batch dropped");
        return false;
    }
    true
}
