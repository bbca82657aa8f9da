//! Order store collaborator: the authoritative record of orders, couriers and settings.

pub mod http;
pub mod memory;
pub mod wire;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::courier::{Courier, CourierDetail};
use crate::models::order::{Order, OrderPatch, OrderStatus, SalesChannel};
use crate::models::settings::Settings;

pub use http::HttpOrderStore;
pub use memory::InMemoryOrderStore;

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn list_orders(&self, channel: Option<SalesChannel>) -> Result<Vec<Order>, StoreError>;

    async fn get_order(&self, id: Uuid) -> Result<Order, StoreError>;

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, StoreError>;

    async fn update_fields(&self, id: Uuid, patch: OrderPatch) -> Result<Order, StoreError>;

    async fn cancel_order(&self, id: Uuid, reason: &str) -> Result<Order, StoreError>;

    async fn assign_courier(&self, id: Uuid, courier_id: Uuid) -> Result<Order, StoreError>;

    async fn list_couriers(&self) -> Result<Vec<Courier>, StoreError>;

    async fn get_courier(&self, id: Uuid) -> Result<CourierDetail, StoreError>;

    async fn get_settings(&self) -> Result<Settings, StoreError>;

    async fn update_settings(&self, settings: Settings) -> Result<Settings, StoreError>;
}
