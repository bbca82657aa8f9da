use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::auto_accept::{self, AutoAcceptPass};
use crate::error::StoreError;
use crate::models::courier::Courier;
use crate::models::event::DispatchEvent;
use crate::models::order::{Order, OrderStatus};
use crate::models::settings::Settings;
use crate::state::AppState;
use crate::store::OrderStore;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub orders: Vec<Order>,
    pub couriers: Vec<Courier>,
    pub settings: Settings,
}

pub async fn fetch_snapshot(store: &dyn OrderStore) -> Result<Snapshot, StoreError> {
    let (orders, couriers, settings) = tokio::try_join!(
        store.list_orders(None),
        store.list_couriers(),
        store.get_settings()
    )?;

    Ok(Snapshot {
        orders,
        couriers,
        settings,
    })
}

/// Remembers which orders were awaiting acceptance last cycle.
#[derive(Debug, Default)]
pub struct ArrivalTracker {
    seen: Option<HashSet<Uuid>>,
}

impl ArrivalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the awaiting orders missing from the previous observation.
    /// The first observation only records the baseline.
    pub fn observe(&mut self, orders: &[Order]) -> Vec<Uuid> {
        let awaiting: Vec<Uuid> = orders
            .iter()
            .filter(|order| {
                order.status == OrderStatus::AwaitingAcceptance && order.belongs_to_dispatch()
            })
            .map(|order| order.id)
            .collect();

        let arrived = match &self.seen {
            None => Vec::new(),
            Some(seen) => awaiting
                .iter()
                .filter(|id| !seen.contains(id))
                .copied()
                .collect(),
        };

        self.seen = Some(awaiting.into_iter().collect());
        arrived
    }
}

#[derive(Debug)]
pub enum CycleOutcome {
    Synced { orders: usize },
    Failed(StoreError),
}

#[derive(Debug)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub new_orders: Vec<Uuid>,
    pub auto_accept: Option<AutoAcceptPass>,
}

/// One polling cycle's worth of work, kept separate from the timer so it
/// can be driven directly.
pub struct SyncWorker {
    state: Arc<AppState>,
    arrivals: ArrivalTracker,
}

impl SyncWorker {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            arrivals: ArrivalTracker::new(),
        }
    }

    pub async fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();
        let snapshot = match fetch_snapshot(self.state.store.as_ref()).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.observe_latency("error", started);
                self.state
                    .metrics
                    .sync_cycles_total
                    .with_label_values(&["error"])
                    .inc();
                warn!(error = %err, "order store poll failed; keeping last snapshot");

                return CycleReport {
                    outcome: CycleOutcome::Failed(err),
                    new_orders: Vec::new(),
                    auto_accept: None,
                };
            }
        };
        self.observe_latency("success", started);

        let new_orders = self.arrivals.observe(&snapshot.orders);
        let order_count = snapshot.orders.len();
        let awaiting = snapshot
            .orders
            .iter()
            .filter(|order| order.status == OrderStatus::AwaitingAcceptance)
            .count();

        self.state.apply_snapshot(snapshot);
        self.state
            .metrics
            .orders_awaiting_acceptance
            .set(i64::try_from(awaiting).unwrap_or(i64::MAX));
        self.state
            .metrics
            .sync_cycles_total
            .with_label_values(&["success"])
            .inc();

        if !new_orders.is_empty() {
            info!(count = new_orders.len(), "new orders arrived");
            self.state.publish(DispatchEvent::NewOrders {
                order_ids: new_orders.clone(),
            });
        }

        let auto_accept = auto_accept::run_pass(&self.state);

        CycleReport {
            outcome: CycleOutcome::Synced {
                orders: order_count,
            },
            new_orders,
            auto_accept: Some(auto_accept),
        }
    }

    fn observe_latency(&self, outcome: &str, started: Instant) {
        self.state
            .metrics
            .sync_latency_seconds
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());
    }
}

struct RunningLoop {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Fixed-interval polling for as long as the dispatch view is open. Each
/// start begins with a fresh baseline, so reopening never replays arrivals.
pub struct SyncLoop {
    state: Arc<AppState>,
    period: Duration,
    running: Option<RunningLoop>,
}

impl SyncLoop {
    pub fn new(state: Arc<AppState>, period: Duration) -> Self {
        Self {
            state,
            period,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let worker = SyncWorker::new(self.state.clone());
        let task = tokio::spawn(run_loop(worker, self.period, shutdown_rx));

        info!(
            period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX),
            "sync loop started"
        );
        self.running = Some(RunningLoop { shutdown_tx, task });
    }

    /// Stops polling, abandoning a poll still in progress. Transitions already
    /// issued keep running to completion.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        let _ = running.shutdown_tx.send(());
        if let Err(err) = running.task.await {
            error!(error = %err, "sync loop task ended abnormally");
        }
        info!("sync loop stopped");
    }
}

async fn run_loop(mut worker: SyncWorker, period: Duration, mut shutdown_rx: oneshot::Receiver<()>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {}
        }
        // A stalled poll must not hold up shutdown.
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = worker.run_cycle() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::ArrivalTracker;
    use crate::models::order::{DeliveryMode, Order, OrderStatus, SalesChannel};

    fn awaiting(id: Uuid) -> Order {
        Order {
            id,
            code: id.to_string(),
            status: OrderStatus::AwaitingAcceptance,
            mode: DeliveryMode::Delivery,
            channel: SalesChannel::Delivery,
            customer_name: "Cliente".to_string(),
            customer_phone: String::new(),
            address: None,
            items: Vec::new(),
            total: 0.0,
            payment_method: None,
            courier_id: None,
            created_at: Utc::now(),
            cancellation_reason: None,
        }
    }

    #[test]
    fn first_observation_is_only_a_baseline() {
        let mut tracker = ArrivalTracker::new();

        assert!(tracker.observe(&[awaiting(Uuid::new_v4())]).is_empty());
    }

    #[test]
    fn reports_only_orders_missing_last_time() {
        let a = awaiting(Uuid::new_v4());
        let b = awaiting(Uuid::new_v4());
        let mut tracker = ArrivalTracker::new();

        tracker.observe(&[a.clone()]);
        let arrived = tracker.observe(&[a.clone(), b.clone()]);

        assert_eq!(arrived, vec![b.id]);
        assert!(tracker.observe(&[a, b]).is_empty());
    }

    #[test]
    fn accepted_order_leaving_the_set_is_not_an_arrival() {
        let a = awaiting(Uuid::new_v4());
        let mut accepted = a.clone();
        accepted.status = OrderStatus::InProduction;
        let mut tracker = ArrivalTracker::new();

        tracker.observe(&[a.clone()]);
        assert!(tracker.observe(&[accepted]).is_empty());
        // Back in the awaiting set after leaving it counts as new again.
        assert_eq!(tracker.observe(&[a.clone()]), vec![a.id]);
    }

    #[test]
    fn other_channels_never_notify() {
        let mut counter = awaiting(Uuid::new_v4());
        counter.channel = SalesChannel::Counter;
        let mut tracker = ArrivalTracker::new();

        tracker.observe(&[]);
        assert!(tracker.observe(&[counter]).is_empty());
    }
}
