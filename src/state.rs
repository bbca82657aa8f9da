use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::engine::assignment::is_selectable;
use crate::engine::auto_accept::AutoAcceptController;
use crate::engine::sync::Snapshot;
use crate::error::AppError;
use crate::models::courier::Courier;
use crate::models::event::DispatchEvent;
use crate::models::order::Order;
use crate::models::settings::Settings;
use crate::observability::metrics::Metrics;
use crate::print::{PrintBridge, PrintConnector};
use crate::store::OrderStore;
use crate::view::state::ViewState;

/// The dispatch desk's working set plus the collaborators it talks to.
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub orders: DashMap<Uuid, Order>,
    pub couriers: DashMap<Uuid, Courier>,
    settings: RwLock<Settings>,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub print: PrintBridge,
    pub auto_accept: AutoAcceptController,
    pub view: ViewState,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn OrderStore>,
        print_connector: Arc<dyn PrintConnector>,
        event_buffer_size: usize,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            store,
            orders: DashMap::new(),
            couriers: DashMap::new(),
            settings: RwLock::new(Settings::default()),
            events_tx,
            print: PrintBridge::new(print_connector),
            auto_accept: AutoAcceptController::new(),
            view: ViewState::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_settings(&self, settings: Settings) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn order(&self, id: Uuid) -> Result<Order, AppError> {
        self.orders
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
    }

    /// Orders oldest first; ties broken by id so the result is stable.
    pub fn orders_snapshot(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        orders
    }

    /// Replaces the working set with a fresh store snapshot. The latest poll
    /// always wins over optimistic local edits.
    pub fn apply_snapshot(&self, snapshot: Snapshot) {
        let Snapshot {
            orders,
            couriers,
            settings,
        } = snapshot;

        let order_ids: HashSet<Uuid> = orders.iter().map(|order| order.id).collect();
        self.orders.retain(|id, _| order_ids.contains(id));
        for order in orders {
            self.orders.insert(order.id, order);
        }

        let courier_ids: HashSet<Uuid> = couriers.iter().map(|courier| courier.id).collect();
        self.couriers.retain(|id, _| courier_ids.contains(id));
        for courier in couriers {
            self.couriers.insert(courier.id, courier);
        }

        self.set_settings(settings);

        self.view.retain_orders(|id| {
            self.orders
                .get(id)
                .is_some_and(|order| is_selectable(order.value()))
        });
    }

    pub fn publish(&self, event: DispatchEvent) {
        let _ = self.events_tx.send(event);
    }
}
