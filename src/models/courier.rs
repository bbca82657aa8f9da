use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::Order;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Courier {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub active: bool,
}

/// A courier together with the orders currently assigned to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierDetail {
    pub courier: Courier,
    pub orders: Vec<Order>,
}
