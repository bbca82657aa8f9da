#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use tokio::sync::Semaphore;
use uuid::Uuid;

use order_dispatch::engine::sync::fetch_snapshot;
use order_dispatch::error::StoreError;
use order_dispatch::models::courier::{Courier, CourierDetail};
use order_dispatch::models::order::{
    Address, DeliveryMode, Order, OrderItem, OrderPatch, OrderStatus, SalesChannel,
};
use order_dispatch::models::settings::{PrintSettings, Printer, Settings};
use order_dispatch::print::{PrintConnector, PrintError, PrintJob};
use order_dispatch::state::AppState;
use order_dispatch::store::{InMemoryOrderStore, OrderStore};

static SEQUENCE: AtomicUsize = AtomicUsize::new(0);

pub fn order(code: &str, status: OrderStatus, mode: DeliveryMode) -> Order {
    let minute = SEQUENCE.fetch_add(1, Ordering::SeqCst) as i64;
    let address = match mode {
        DeliveryMode::Delivery => Some(Address {
            street: "Rua das Flores".to_string(),
            number: "120".to_string(),
            complement: Some("ap 31".to_string()),
            neighborhood: "Centro".to_string(),
        }),
        DeliveryMode::Pickup => None,
    };

    Order {
        id: Uuid::new_v4(),
        code: code.to_string(),
        status,
        mode,
        channel: SalesChannel::Delivery,
        customer_name: "Maria".to_string(),
        customer_phone: "11988887777".to_string(),
        address,
        items: vec![OrderItem {
            name: "X-Salada".to_string(),
            quantity: 2,
            unit_price: 22.5,
            note: None,
        }],
        total: 45.0,
        payment_method: None,
        courier_id: None,
        created_at: Utc.with_ymd_and_hms(2026, 10, 19, 19, 0, 0).unwrap()
            + ChronoDuration::minutes(minute),
        cancellation_reason: None,
    }
}

pub fn courier(name: &str, active: bool) -> Courier {
    Courier {
        id: Uuid::new_v4(),
        name: name.to_string(),
        phone: "11911112222".to_string(),
        active,
    }
}

pub fn printing_settings(auto_accept: bool) -> Settings {
    Settings {
        auto_accept,
        printing: PrintSettings {
            enabled: true,
            printers: vec![
                Printer {
                    id: Uuid::new_v4(),
                    name: "balcao".to_string(),
                    active: true,
                    is_default: false,
                },
                Printer {
                    id: Uuid::new_v4(),
                    name: "cozinha".to_string(),
                    active: true,
                    is_default: true,
                },
            ],
        },
    }
}

#[derive(Default)]
pub struct RecordingConnector {
    pub jobs: Mutex<Vec<PrintJob>>,
}

impl RecordingConnector {
    pub fn jobs(&self) -> Vec<PrintJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl PrintConnector for RecordingConnector {
    fn enqueue(&self, job: PrintJob) -> Result<(), PrintError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<InMemoryOrderStore>,
    pub printer: Arc<RecordingConnector>,
    pub state: Arc<AppState>,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryOrderStore::new());
    let printer = Arc::new(RecordingConnector::default());
    let state = Arc::new(AppState::new(store.clone(), printer.clone(), 256));
    Harness {
        store,
        printer,
        state,
    }
}

/// Pulls the store's current contents into the working set.
pub async fn load(state: &AppState) {
    let snapshot = fetch_snapshot(state.store.as_ref())
        .await
        .expect("store snapshot");
    state.apply_snapshot(snapshot);
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Store whose status updates park until the test opens the gate. Built with
/// `stalling_polls`, order listing parks instead.
pub struct GatedStore {
    inner: Arc<InMemoryOrderStore>,
    gate: Semaphore,
    entered: AtomicUsize,
    gate_polls: bool,
}

impl GatedStore {
    pub fn new(inner: Arc<InMemoryOrderStore>) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            entered: AtomicUsize::new(0),
            gate_polls: false,
        }
    }

    pub fn stalling_polls(inner: Arc<InMemoryOrderStore>) -> Self {
        Self {
            gate_polls: true,
            ..Self::new(inner)
        }
    }

    async fn pass_gate(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let _permit = self.gate.acquire().await.expect("gate closed");
    }

    pub fn waiting(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn open(&self) {
        self.gate.add_permits(1_000);
    }
}

#[async_trait]
impl OrderStore for GatedStore {
    async fn list_orders(&self, channel: Option<SalesChannel>) -> Result<Vec<Order>, StoreError> {
        if self.gate_polls {
            self.pass_gate().await;
        }
        self.inner.list_orders(channel).await
    }

    async fn get_order(&self, id: Uuid) -> Result<Order, StoreError> {
        self.inner.get_order(id).await
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, StoreError> {
        if !self.gate_polls {
            self.pass_gate().await;
        }
        self.inner.update_status(id, status).await
    }

    async fn update_fields(&self, id: Uuid, patch: OrderPatch) -> Result<Order, StoreError> {
        self.inner.update_fields(id, patch).await
    }

    async fn cancel_order(&self, id: Uuid, reason: &str) -> Result<Order, StoreError> {
        self.inner.cancel_order(id, reason).await
    }

    async fn assign_courier(&self, id: Uuid, courier_id: Uuid) -> Result<Order, StoreError> {
        self.inner.assign_courier(id, courier_id).await
    }

    async fn list_couriers(&self) -> Result<Vec<Courier>, StoreError> {
        self.inner.list_couriers().await
    }

    async fn get_courier(&self, id: Uuid) -> Result<CourierDetail, StoreError> {
        self.inner.get_courier(id).await
    }

    async fn get_settings(&self) -> Result<Settings, StoreError> {
        self.inner.get_settings().await
    }

    async fn update_settings(&self, settings: Settings) -> Result<Settings, StoreError> {
        self.inner.update_settings(settings).await
    }
}
