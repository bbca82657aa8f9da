use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::engine::machine::{self, MIN_CANCEL_REASON_LEN};
use crate::error::StoreError;
use crate::models::courier::{Courier, CourierDetail};
use crate::models::order::{Order, OrderPatch, OrderStatus, SalesChannel};
use crate::models::settings::Settings;
use crate::store::OrderStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    ListOrders,
    GetOrder(Uuid),
    UpdateStatus(Uuid, OrderStatus),
    UpdateFields(Uuid),
    CancelOrder(Uuid),
    AssignCourier { order_id: Uuid, courier_id: Uuid },
    ListCouriers,
    GetCourier(Uuid),
    GetSettings,
    UpdateSettings,
}

/// Process-local order store. Applies the same transition rules a remote store
/// would, records every call, and can be told to go offline or refuse writes.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<Uuid, Order>,
    couriers: DashMap<Uuid, Courier>,
    settings: RwLock<Settings>,
    calls: Mutex<Vec<StoreCall>>,
    offline: AtomicBool,
    refused_writes: DashMap<Uuid, String>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_order(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn insert_courier(&self, courier: Courier) {
        self.couriers.insert(courier.id, courier);
    }

    pub fn set_settings(&self, settings: Settings) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn order(&self, id: Uuid) -> Option<Order> {
        self.orders.get(&id).map(|entry| entry.value().clone())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every later write touching `order_id` fails with `StoreError::Rejected`.
    pub fn refuse_writes_for(&self, order_id: Uuid, reason: impl Into<String>) {
        self.refused_writes.insert(order_id, reason.into());
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self, order_id: Uuid) -> Result<(), StoreError> {
        match self.refused_writes.get(&order_id) {
            Some(reason) => Err(StoreError::Rejected(reason.value().clone())),
            None => Ok(()),
        }
    }

    fn order_not_found(id: Uuid) -> StoreError {
        StoreError::NotFound(format!("order {id}"))
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn list_orders(&self, channel: Option<SalesChannel>) -> Result<Vec<Order>, StoreError> {
        self.record(StoreCall::ListOrders)?;

        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| channel.is_none_or(|channel| entry.value().channel == channel))
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(orders)
    }

    async fn get_order(&self, id: Uuid) -> Result<Order, StoreError> {
        self.record(StoreCall::GetOrder(id))?;
        self.order(id).ok_or_else(|| Self::order_not_found(id))
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, StoreError> {
        self.record(StoreCall::UpdateStatus(id, status))?;
        self.check_writable(id)?;

        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| Self::order_not_found(id))?;

        let steps = machine::path(order.mode);
        let follows = steps
            .windows(2)
            .any(|pair| pair[0] == order.status && pair[1] == status);
        // Couriers are attached through `assign_courier`, never a bare status write.
        if !follows || status == OrderStatus::Bagged {
            return Err(StoreError::Rejected(format!(
                "order {id} cannot move from {} to {status}",
                order.status
            )));
        }

        order.status = status;
        Ok(order.clone())
    }

    async fn update_fields(&self, id: Uuid, patch: OrderPatch) -> Result<Order, StoreError> {
        self.record(StoreCall::UpdateFields(id))?;
        self.check_writable(id)?;

        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| Self::order_not_found(id))?;

        if let Some(payment_method) = patch.payment_method {
            order.payment_method = Some(payment_method);
        }
        Ok(order.clone())
    }

    async fn cancel_order(&self, id: Uuid, reason: &str) -> Result<Order, StoreError> {
        self.record(StoreCall::CancelOrder(id))?;
        self.check_writable(id)?;

        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| Self::order_not_found(id))?;

        if order.status.is_terminal() {
            return Err(StoreError::Rejected(format!(
                "order {id} is already {}",
                order.status
            )));
        }
        if reason.trim().chars().count() < MIN_CANCEL_REASON_LEN {
            return Err(StoreError::Rejected("cancellation reason too short".to_string()));
        }

        order.status = OrderStatus::Cancelled;
        order.cancellation_reason = Some(reason.trim().to_string());
        Ok(order.clone())
    }

    async fn assign_courier(&self, id: Uuid, courier_id: Uuid) -> Result<Order, StoreError> {
        self.record(StoreCall::AssignCourier {
            order_id: id,
            courier_id,
        })?;
        self.check_writable(id)?;

        let active = self
            .couriers
            .get(&courier_id)
            .map(|courier| courier.active)
            .ok_or_else(|| StoreError::NotFound(format!("courier {courier_id}")))?;
        if !active {
            return Err(StoreError::Rejected(format!("courier {courier_id} is inactive")));
        }

        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| Self::order_not_found(id))?;

        if order.is_pickup() || order.status != OrderStatus::Ready {
            return Err(StoreError::Rejected(format!(
                "order {id} cannot be bagged while {}",
                order.status
            )));
        }

        order.status = OrderStatus::Bagged;
        order.courier_id = Some(courier_id);
        Ok(order.clone())
    }

    async fn list_couriers(&self) -> Result<Vec<Courier>, StoreError> {
        self.record(StoreCall::ListCouriers)?;

        let mut couriers: Vec<Courier> = self
            .couriers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        couriers.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(couriers)
    }

    async fn get_courier(&self, id: Uuid) -> Result<CourierDetail, StoreError> {
        self.record(StoreCall::GetCourier(id))?;

        let courier = self
            .couriers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("courier {id}")))?;

        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| {
                let order = entry.value();
                order.courier_id == Some(id)
                    && matches!(order.status, OrderStatus::Bagged | OrderStatus::EnRoute)
            })
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(CourierDetail { courier, orders })
    }

    async fn get_settings(&self) -> Result<Settings, StoreError> {
        self.record(StoreCall::GetSettings)?;
        Ok(self
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn update_settings(&self, settings: Settings) -> Result<Settings, StoreError> {
        self.record(StoreCall::UpdateSettings)?;
        self.set_settings(settings.clone());
        Ok(settings)
    }
}
