use std::io::Write;
use std::time::Duration;

use crate::progress::{ProgressReceiver, ProgressTotals, Recv};

const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Outcome of one `drain` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// The queue was empty for a full poll timeout. Producers may still send.
    Idle,
    /// Every sender is gone and nothing is left to read.
    Closed,
}

/// Single consumer of the progress queue. Owns the running totals and
/// renders them as a carriage-return status line.
pub struct ProgressReporter<W: Write> {
    rx: ProgressReceiver,
    out: W,
    totals: ProgressTotals,
    poll_timeout: Duration,
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(rx: ProgressReceiver, out: W) -> Self {
        Self {
            rx,
            out,
            totals: ProgressTotals::default(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn totals(&self) -> ProgressTotals {
        self.totals
    }

    /// Applies every event currently available, rendering after each one.
    pub async fn drain(&mut self) -> Drain {
        loop {
            match self.rx.recv_timeout(self.poll_timeout).await {
                Recv::Item(event) => {
                    self.totals.apply(&event);
                    self.render();
                }
                Recv::Empty => return Drain::Idle,
                Recv::Closed => return Drain::Closed,
            }
        }
    }

    /// Drains until every producer has dropped its sender.
    pub async fn run(mut self) -> ProgressTotals {
        while self.drain().await == Drain::Idle {}
        self.render();
        if let Err(e) = writeln!(self.out) {
            tracing::debug!(error = %e, "progress output unavailable");
        }
        self.totals
    }

    fn render(&mut self) {
        let res = write!(self.out, "\r{} ", self.totals).and_then(|_| self.out.flush());
        if let Err(e) = res {
            tracing::debug!(error = %e, "progress output unavailable");
        }
    }
}
