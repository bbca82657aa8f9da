//! Order payloads as the remote store sends them. Item records arrive under
//! several aliased field names; they are normalised here into `OrderItem` so
//! nothing past the store boundary ever sees the aliases.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::order::{
    Address, DeliveryMode, Order, OrderItem, OrderStatus, PaymentMethod, SalesChannel,
};

#[derive(Debug, Deserialize)]
pub struct WireItem {
    #[serde(alias = "nome", alias = "product_name")]
    pub name: String,
    #[serde(default, alias = "qty", alias = "qtd", alias = "quantidade")]
    pub quantity: Option<u32>,
    #[serde(
        default,
        alias = "price",
        alias = "preco",
        alias = "valor_unitario",
        alias = "unitPrice"
    )]
    pub unit_price: Option<f64>,
    #[serde(default, alias = "subtotal", alias = "total_price")]
    pub line_total: Option<f64>,
    #[serde(default, alias = "notes", alias = "obs", alias = "observacao")]
    pub note: Option<String>,
}

impl From<WireItem> for OrderItem {
    fn from(item: WireItem) -> Self {
        let quantity = item.quantity.unwrap_or(1);
        let unit_price = match (item.unit_price, item.line_total) {
            (Some(price), _) => price,
            (None, Some(total)) if quantity > 0 => total / f64::from(quantity),
            _ => 0.0,
        };
        let note = item
            .note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty());

        OrderItem {
            name: item.name,
            quantity,
            unit_price,
            note,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireOrder {
    pub id: Uuid,
    pub code: String,
    pub status: OrderStatus,
    pub mode: DeliveryMode,
    #[serde(default)]
    pub channel: SalesChannel,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub items: Vec<WireItem>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub courier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

impl From<WireOrder> for Order {
    fn from(wire: WireOrder) -> Self {
        let items: Vec<OrderItem> = wire.items.into_iter().map(OrderItem::from).collect();
        let total = wire
            .total
            .unwrap_or_else(|| items.iter().map(OrderItem::subtotal).sum());
        // Pickup orders carry no address even if the store echoes one back.
        let address = match wire.mode {
            DeliveryMode::Delivery => wire.address,
            DeliveryMode::Pickup => None,
        };

        Order {
            id: wire.id,
            code: wire.code,
            status: wire.status,
            mode: wire.mode,
            channel: wire.channel,
            customer_name: wire.customer_name,
            customer_phone: wire.customer_phone,
            address,
            items,
            total,
            payment_method: wire.payment_method,
            courier_id: wire.courier_id,
            created_at: wire.created_at,
            cancellation_reason: wire.cancellation_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireCourierDetail {
    pub courier: crate::models::courier::Courier,
    #[serde(default)]
    pub orders: Vec<WireOrder>,
}
