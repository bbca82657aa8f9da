use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::order::{DeliveryMode, Order, OrderStatus};

pub const MIN_CANCEL_REASON_LEN: usize = 3;

const DELIVERY_PATH: &[OrderStatus] = &[
    OrderStatus::AwaitingAcceptance,
    OrderStatus::InProduction,
    OrderStatus::Ready,
    OrderStatus::Bagged,
    OrderStatus::EnRoute,
    OrderStatus::Completed,
];

const PICKUP_PATH: &[OrderStatus] = &[
    OrderStatus::AwaitingAcceptance,
    OrderStatus::InProduction,
    OrderStatus::Ready,
    OrderStatus::Completed,
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Accept,
    MarkReady,
    AssignCourier,
    SendToRoute,
    CompleteDelivery,
    CompletePickup,
    Cancel,
}

impl Transition {
    pub const ALL: [Transition; 7] = [
        Transition::Accept,
        Transition::MarkReady,
        Transition::AssignCourier,
        Transition::SendToRoute,
        Transition::CompleteDelivery,
        Transition::CompletePickup,
        Transition::Cancel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Accept => "accept",
            Transition::MarkReady => "mark_ready",
            Transition::AssignCourier => "assign_courier",
            Transition::SendToRoute => "send_to_route",
            Transition::CompleteDelivery => "complete_delivery",
            Transition::CompletePickup => "complete_pickup",
            Transition::Cancel => "cancel",
        }
    }

    /// Transitions that put a ticket on the kitchen printer.
    pub fn triggers_print(self) -> bool {
        matches!(self, Transition::Accept | Transition::MarkReady)
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordered statuses an order of `mode` walks through, excluding cancellation.
pub fn path(mode: DeliveryMode) -> &'static [OrderStatus] {
    match mode {
        DeliveryMode::Delivery => DELIVERY_PATH,
        DeliveryMode::Pickup => PICKUP_PATH,
    }
}

pub fn is_valid_status(mode: DeliveryMode, status: OrderStatus) -> bool {
    status == OrderStatus::Cancelled || path(mode).contains(&status)
}

/// Resolves the status `transition` leads to from the order's last known status.
pub fn next_status(order: &Order, transition: Transition) -> Result<OrderStatus, AppError> {
    next_status_for(order.mode, order.status, transition).map_err(|reason| match reason {
        Refusal::PickupHasNoCourier => AppError::Validation(format!(
            "order {} is a pickup order and cannot be assigned a courier",
            order.id
        )),
        Refusal::NotFromHere => AppError::IllegalTransition {
            order_id: order.id,
            transition,
            status: order.status,
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    PickupHasNoCourier,
    NotFromHere,
}

pub fn next_status_for(
    mode: DeliveryMode,
    status: OrderStatus,
    transition: Transition,
) -> Result<OrderStatus, Refusal> {
    use DeliveryMode::{Delivery, Pickup};
    use OrderStatus::*;

    if status.is_terminal() {
        return Err(Refusal::NotFromHere);
    }

    match (transition, status, mode) {
        (Transition::Accept, AwaitingAcceptance, _) => Ok(InProduction),
        (Transition::MarkReady, InProduction, _) => Ok(Ready),
        (Transition::AssignCourier, _, Pickup) => Err(Refusal::PickupHasNoCourier),
        (Transition::AssignCourier, Ready, Delivery) => Ok(Bagged),
        (Transition::SendToRoute, Bagged, Delivery) => Ok(EnRoute),
        (Transition::CompleteDelivery, EnRoute, Delivery) => Ok(Completed),
        (Transition::CompletePickup, Ready, Pickup) => Ok(Completed),
        (Transition::Cancel, _, _) => Ok(Cancelled),
        _ => Err(Refusal::NotFromHere),
    }
}

/// Returns the trimmed reason, or a validation error when it is too short.
pub fn validate_cancel_reason(reason: &str) -> Result<String, AppError> {
    let trimmed = reason.trim();
    if trimmed.chars().count() < MIN_CANCEL_REASON_LEN {
        return Err(AppError::Validation(format!(
            "cancellation reason must have at least {MIN_CANCEL_REASON_LEN} characters"
        )));
    }

    Ok(trimmed.to_string())
}
