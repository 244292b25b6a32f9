//! Unbounded FIFO between the producers and the single sink.
//!
//! [`RowQueue::channel`] hands out a cloneable [`RowSender`] and exactly one
//! [`RowReceiver`]. The receiver cannot be cloned, so only one consumer can
//! ever take rows off the queue.

use crate::domain::model::TransformedRow;
use crate::utils::error::{PipelineError, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct RowQueue;

impl RowQueue {
    pub fn channel() -> (RowSender, RowReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RowSender { tx }, RowReceiver { rx })
    }
}

#[derive(Debug, Clone)]
pub struct RowSender {
    tx: mpsc::UnboundedSender<TransformedRow>,
}

impl RowSender {
    /// Never blocks. Only fails once the receiver has been dropped.
    pub fn enqueue(&self, row: TransformedRow) -> Result<()> {
        self.tx.send(row).map_err(|_| PipelineError::QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug)]
pub struct RowReceiver {
    rx: mpsc::UnboundedReceiver<TransformedRow>,
}

impl RowReceiver {
    /// Waits for the next row. `None` once every sender is gone and the
    /// queue is drained.
    pub async fn dequeue(&mut self) -> Option<TransformedRow> {
        self.rx.recv().await
    }

    /// Like [`dequeue`](Self::dequeue) but gives up with
    /// [`PipelineError::InterruptedWait`] when `cancel` fires first.
    pub async fn dequeue_or_cancel(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<TransformedRow>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::InterruptedWait),
            row = self.rx.recv() => Ok(row),
        }
    }

    pub fn try_dequeue(&mut self) -> Option<TransformedRow> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
