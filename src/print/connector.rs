use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::order::Order;
use crate::models::settings::Printer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    pub order: Order,
    pub printer: Printer,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq)]
pub enum PrintError {
    #[error("print queue is full")]
    QueueFull,

    #[error("print connector is gone")]
    Disconnected,
}

/// Fire-and-forget hand-off to the out-of-process print connector.
pub trait PrintConnector: Send + Sync {
    fn enqueue(&self, job: PrintJob) -> Result<(), PrintError>;
}

/// Connector that parks jobs on a bounded queue drained by a worker task.
#[derive(Debug, Clone)]
pub struct ChannelPrintConnector {
    jobs_tx: mpsc::Sender<PrintJob>,
}

impl ChannelPrintConnector {
    pub fn new(queue_size: usize) -> (Self, mpsc::Receiver<PrintJob>) {
        let (jobs_tx, jobs_rx) = mpsc::channel(queue_size);
        (Self { jobs_tx }, jobs_rx)
    }
}

impl PrintConnector for ChannelPrintConnector {
    fn enqueue(&self, job: PrintJob) -> Result<(), PrintError> {
        self.jobs_tx.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => PrintError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => PrintError::Disconnected,
        })
    }
}
