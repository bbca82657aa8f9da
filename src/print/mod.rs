//! Print queue bridge: turns accept/mark-ready into print jobs and keeps the
//! per-order print error flag the view uses for alerts. It never touches an
//! order's status.

pub mod connector;

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::machine::Transition;
use crate::models::event::DispatchEvent;
use crate::models::order::Order;
use crate::models::settings::PrintSettings;

pub use connector::{ChannelPrintConnector, PrintConnector, PrintError, PrintJob};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrintOutcome {
    Succeeded,
    Failed,
}

/// Inbound report from the print connector about one order's ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrintSignal {
    pub order_id: Uuid,
    pub outcome: PrintOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintRequest {
    NotPrintable,
    Disabled,
    NoPrinter,
    Enqueued,
    Failed,
}

impl PrintRequest {
    pub fn as_str(self) -> &'static str {
        match self {
            PrintRequest::NotPrintable => "not_printable",
            PrintRequest::Disabled => "disabled",
            PrintRequest::NoPrinter => "no_printer",
            PrintRequest::Enqueued => "enqueued",
            PrintRequest::Failed => "failed",
        }
    }
}

pub struct PrintBridge {
    connector: Arc<dyn PrintConnector>,
    errors: DashMap<Uuid, bool>,
}

impl PrintBridge {
    pub fn new(connector: Arc<dyn PrintConnector>) -> Self {
        Self {
            connector,
            errors: DashMap::new(),
        }
    }

    /// Enqueues a ticket when `transition` prints and printing is on.
    /// A failed hand-off only raises the order's print error flag.
    pub fn on_transition(
        &self,
        order: &Order,
        transition: Transition,
        settings: &PrintSettings,
    ) -> (PrintRequest, Option<DispatchEvent>) {
        if !transition.triggers_print() {
            return (PrintRequest::NotPrintable, None);
        }
        if !settings.enabled {
            return (PrintRequest::Disabled, None);
        }
        let Some(printer) = settings.target_printer() else {
            warn!(order_id = %order.id, "printing enabled but no printer is active");
            return (PrintRequest::NoPrinter, None);
        };

        let job = PrintJob {
            order: order.clone(),
            printer: printer.clone(),
            requested_at: Utc::now(),
        };

        match self.connector.enqueue(job) {
            Ok(()) => {
                debug!(order_id = %order.id, printer = %printer.name, %transition, "print job enqueued");
                (PrintRequest::Enqueued, None)
            }
            Err(err) => {
                warn!(order_id = %order.id, error = %err, "failed to enqueue print job");
                let event = self.mark(order.id, true);
                (PrintRequest::Failed, event)
            }
        }
    }

    /// Applies a connector report; returns an event only when the flag flips.
    pub fn record_signal(&self, signal: PrintSignal) -> Option<DispatchEvent> {
        let failed = signal.outcome == PrintOutcome::Failed;
        self.mark(signal.order_id, failed)
    }

    pub fn has_error(&self, order_id: Uuid) -> bool {
        self.errors.get(&order_id).is_some_and(|flag| *flag.value())
    }

    pub fn orders_with_errors(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .errors
            .iter()
            .filter(|entry| *entry.value())
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        ids
    }

    fn mark(&self, order_id: Uuid, failed: bool) -> Option<DispatchEvent> {
        let previous = self.errors.insert(order_id, failed).unwrap_or(false);

        match (previous, failed) {
            (false, true) => Some(DispatchEvent::PrintFailed { order_id }),
            (true, false) => Some(DispatchEvent::PrintRecovered { order_id }),
            _ => None,
        }
    }
}
