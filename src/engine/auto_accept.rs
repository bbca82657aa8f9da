use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::assignment::fan_out;
use crate::engine::transitions;
use crate::models::batch::BatchReport;
use crate::models::order::OrderStatus;
use crate::state::AppState;

/// Tracks whether an auto-accept batch is still running, and which orders an
/// earlier batch failed to accept. Those are left to the operator.
#[derive(Debug, Default)]
pub struct AutoAcceptController {
    in_flight: Arc<AtomicBool>,
    failed: Mutex<HashSet<Uuid>>,
}

/// Held by the running batch; dropping it, even while unwinding, frees the slot.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

impl AutoAcceptController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                in_flight: self.in_flight.clone(),
            })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn record_failures(&self, order_ids: impl IntoIterator<Item = Uuid>) {
        self.failures().extend(order_ids);
    }

    pub fn has_failed(&self, order_id: Uuid) -> bool {
        self.failures().contains(&order_id)
    }

    /// Forgets failures for orders no longer awaiting acceptance.
    pub fn retain_failures(&self, awaiting: &HashSet<Uuid>) {
        self.failures().retain(|id| awaiting.contains(id));
    }

    fn failures(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        self.failed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub enum AutoAcceptPass {
    Disabled,
    /// Nothing is waiting for acceptance.
    Idle,
    /// The previous batch has not finished; this pass issued no calls.
    Skipped,
    Started {
        order_ids: Vec<Uuid>,
        task: JoinHandle<BatchReport>,
    },
}

impl AutoAcceptPass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoAcceptPass::Disabled => "disabled",
            AutoAcceptPass::Idle => "idle",
            AutoAcceptPass::Skipped => "skipped",
            AutoAcceptPass::Started { .. } => "started",
        }
    }
}

/// Accepts every awaiting order of the dispatch desk concurrently, unless the
/// policy is off or the previous batch is still in flight. An order a batch
/// failed to accept is not tried again while it keeps awaiting acceptance.
pub fn run_pass(state: &Arc<AppState>) -> AutoAcceptPass {
    if !state.settings().auto_accept {
        return AutoAcceptPass::Disabled;
    }

    let awaiting: Vec<Uuid> = state
        .orders_snapshot()
        .into_iter()
        .filter(|order| {
            order.status == OrderStatus::AwaitingAcceptance && order.belongs_to_dispatch()
        })
        .map(|order| order.id)
        .collect();
    state
        .auto_accept
        .retain_failures(&awaiting.iter().copied().collect());

    let order_ids: Vec<Uuid> = awaiting
        .into_iter()
        .filter(|id| !state.auto_accept.has_failed(*id))
        .collect();

    let pass = if order_ids.is_empty() {
        AutoAcceptPass::Idle
    } else {
        match state.auto_accept.try_acquire() {
            None => {
                debug!("previous auto-accept batch still running; skipping pass");
                AutoAcceptPass::Skipped
            }
            Some(guard) => {
                info!(orders = order_ids.len(), "auto-accepting orders");
                let task = tokio::spawn(accept_all(state.clone(), order_ids.clone(), guard));
                AutoAcceptPass::Started { order_ids, task }
            }
        }
    };

    state
        .metrics
        .auto_accept_passes_total
        .with_label_values(&[pass.as_str()])
        .inc();

    pass
}

async fn accept_all(state: Arc<AppState>, order_ids: Vec<Uuid>, _guard: InFlightGuard) -> BatchReport {
    let report = fan_out(order_ids, |order_id| transitions::accept(&state, order_id)).await;

    if !report.failed.is_empty() {
        warn!(
            failed = report.failed.len(),
            "auto-accept left orders for manual acceptance"
        );
        state
            .auto_accept
            .record_failures(report.failed.iter().map(|failure| failure.order_id));
    }
    report
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use uuid::Uuid;

    use super::AutoAcceptController;

    #[test]
    fn second_acquire_fails_until_guard_drops() {
        let controller = AutoAcceptController::new();

        let guard = controller.try_acquire().expect("first acquire");
        assert!(controller.is_in_flight());
        assert!(controller.try_acquire().is_none());

        drop(guard);
        assert!(!controller.is_in_flight());
        assert!(controller.try_acquire().is_some());
    }

    #[test]
    fn failures_are_forgotten_once_the_order_stops_awaiting() {
        let controller = AutoAcceptController::new();
        let stuck = Uuid::new_v4();
        let moved_on = Uuid::new_v4();

        controller.record_failures([stuck, moved_on]);
        controller.retain_failures(&HashSet::from([stuck]));

        assert!(controller.has_failed(stuck));
        assert!(!controller.has_failed(moved_on));
    }
}
