use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Shared depth gauges for a progress queue.
#[derive(Clone, Debug)]
pub struct QueueDepth {
    current: Arc<AtomicUsize>,
    max: Arc<AtomicUsize>,
}

impl QueueDepth {
    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::Relaxed)
    }

    fn on_send(&self) {
        let now = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        let mut prev = self.max.load(Ordering::Relaxed);
        while now > prev {
            match self
                .max
                .compare_exchange_weak(prev, now, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(observed) => prev = observed,
            }
        }
    }

    fn on_recv(&self) {
        self.current.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Clone, Debug)]
pub struct QueueSender<T> {
    inner: mpsc::Sender<T>,
    depth: QueueDepth,
}

#[derive(Debug)]
pub struct QueueReceiver<T> {
    inner: mpsc::Receiver<T>,
    depth: QueueDepth,
}

/// Result of a receive bounded by a timeout.
#[derive(Debug, PartialEq, Eq)]
pub enum Recv<T> {
    Item(T),
    /// Nothing arrived within the timeout; senders may still be alive.
    Empty,
    /// Every sender has been dropped and the queue is drained.
    Closed,
}

pub fn bounded<T>(capacity: usize) -> Result<(QueueSender<T>, QueueReceiver<T>, QueueDepth)> {
    if capacity == 0 {
        return Err(Error::Config(
            "progress queue capacity must be >= 1".to_string(),
        ));
    }

    let (tx, rx) = mpsc::channel(capacity);
    let depth = QueueDepth {
        current: Arc::new(AtomicUsize::new(0)),
        max: Arc::new(AtomicUsize::new(0)),
    };
    Ok((
        QueueSender {
            inner: tx,
            depth: depth.clone(),
        },
        QueueReceiver {
            inner: rx,
            depth: depth.clone(),
        },
        depth,
    ))
}

impl<T> QueueSender<T> {
    pub async fn send(&self, item: T) -> core::result::Result<(), mpsc::error::SendError<T>> {
        // Counted before the send so a fast receiver never decrements first.
        self.depth.on_send();
        if let Err(e) = self.inner.send(item).await {
            self.depth.on_recv();
            return Err(e);
        }
        Ok(())
    }
}

impl<T> QueueReceiver<T> {
    pub async fn recv(&mut self) -> Option<T> {
        let item = self.inner.recv().await;
        if item.is_some() {
            self.depth.on_recv();
        }
        item
    }

    pub async fn recv_timeout(&mut self, timeout: Duration) -> Recv<T> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(Some(item)) => Recv::Item(item),
            Ok(None) => Recv::Closed,
            Err(_) => Recv::Empty,
        }
    }
}
