// queue.rs

use tokio::sync::mpsc::error::SendTimeoutError;

use crate::*;

pub const DISPLAY_QUEUE: &str = "display";
pub const NETWORK_QUEUE: &str = "network";

pub struct QueueSender {
    name: &'static str,
    tx: mpsc::Sender<Reading>,
}

pub struct QueueReceiver {
    name: &'static str,
    rx: mpsc::Receiver<Reading>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Queued,
    Full,
    Closed,
}

#[derive(Debug, PartialEq)]
pub enum RecvOutcome {
    Item(Reading),
    Timeout,
    Closed,
}

pub fn bounded_queue(
    name: &'static str,
    capacity: usize,
) -> Result<(QueueSender, QueueReceiver), PipelineError> {
    if capacity == 0 {
        return Err(PipelineError::QueueCapacity { name });
    }
    let (tx, rx) = mpsc::channel(capacity);
    Ok((QueueSender { name, tx }, QueueReceiver { name, rx }))
}

impl QueueSender {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Waits at most `wait` for a free slot.
    pub async fn send_bounded(&self, reading: Reading, wait: Duration) -> SendOutcome {
        match self.tx.send_timeout(reading, wait).await {
            Ok(()) => SendOutcome::Queued,
            Err(SendTimeoutError::Timeout(_)) => SendOutcome::Full,
            Err(SendTimeoutError::Closed(_)) => SendOutcome::Closed,
        }
    }
}

impl QueueReceiver {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `None` waits indefinitely.
    pub async fn recv_within(&mut self, wait: Option<Duration>) -> RecvOutcome {
        let item = match wait {
            None => self.rx.recv().await,
            Some(wait) => match timeout(wait, self.rx.recv()).await {
                Ok(item) => item,
                Err(_) => return RecvOutcome::Timeout,
            },
        };
        match item {
            Some(r) => RecvOutcome::Item(r),
            None => RecvOutcome::Closed,
        }
    }
}


// EOF
