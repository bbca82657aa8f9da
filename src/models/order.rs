use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    AwaitingAcceptance,
    InProduction,
    Ready,
    Bagged,
    EnRoute,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::AwaitingAcceptance => "awaiting_acceptance",
            OrderStatus::InProduction => "in_production",
            OrderStatus::Ready => "ready",
            OrderStatus::Bagged => "bagged",
            OrderStatus::EnRoute => "en_route",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    Delivery,
    Pickup,
}

/// Where the order was placed. Only `Delivery` orders belong to the dispatch desk.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    #[default]
    Delivery,
    DineIn,
    Counter,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    Cash,
    Credit,
    Debit,
    Voucher,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub note: Option<String>,
}

impl OrderItem {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub code: String,
    pub status: OrderStatus,
    pub mode: DeliveryMode,
    #[serde(default)]
    pub channel: SalesChannel,
    pub customer_name: String,
    pub customer_phone: String,
    pub address: Option<Address>,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub payment_method: Option<PaymentMethod>,
    pub courier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub cancellation_reason: Option<String>,
}

impl Order {
    pub fn is_pickup(&self) -> bool {
        self.mode == DeliveryMode::Pickup
    }

    pub fn belongs_to_dispatch(&self) -> bool {
        self.channel == SalesChannel::Delivery
    }
}

/// Arbitrary field updates sent alongside a transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}
