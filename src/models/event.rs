use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::machine::Transition;
use crate::models::order::OrderStatus;

/// Events pushed to the operator view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// Raised at most once per sync cycle; lists every order that newly arrived.
    NewOrders { order_ids: Vec<Uuid> },
    OrderTransitioned {
        order_id: Uuid,
        transition: Transition,
        status: OrderStatus,
    },
    PrintFailed { order_id: Uuid },
    PrintRecovered { order_id: Uuid },
}
