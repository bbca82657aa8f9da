use std::future::Future;

use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::machine::{self, Transition};
use crate::error::{AppError, StoreError};
use crate::models::event::DispatchEvent;
use crate::models::order::{Order, OrderPatch, OrderStatus, PaymentMethod};
use crate::print::PrintRequest;
use crate::state::AppState;

pub async fn accept(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    run_transition(state, order_id, Transition::Accept, |_| {}, |target| {
        state.store.update_status(order_id, target)
    })
    .await
}

pub async fn mark_ready(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    run_transition(state, order_id, Transition::MarkReady, |_| {}, |target| {
        state.store.update_status(order_id, target)
    })
    .await
}

pub async fn assign_courier(
    state: &AppState,
    order_id: Uuid,
    courier_id: Uuid,
) -> Result<Order, AppError> {
    let active = state
        .couriers
        .get(&courier_id)
        .map(|courier| courier.active)
        .ok_or_else(|| AppError::NotFound(format!("courier {courier_id} not found")))?;
    if !active {
        return Err(AppError::Validation(format!(
            "courier {courier_id} is not active"
        )));
    }

    run_transition(
        state,
        order_id,
        Transition::AssignCourier,
        |order| order.courier_id = Some(courier_id),
        |_| state.store.assign_courier(order_id, courier_id),
    )
    .await
}

pub async fn send_to_route(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    run_transition(state, order_id, Transition::SendToRoute, |_| {}, |target| {
        state.store.update_status(order_id, target)
    })
    .await
}

pub async fn complete_delivery(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    run_transition(state, order_id, Transition::CompleteDelivery, |_| {}, |target| {
        state.store.update_status(order_id, target)
    })
    .await
}

/// Records the payment method, then closes the pickup order.
pub async fn complete_pickup(
    state: &AppState,
    order_id: Uuid,
    payment_method: Option<PaymentMethod>,
) -> Result<Order, AppError> {
    let payment_method = payment_method.ok_or_else(|| {
        AppError::Validation("a payment method is required to complete a pickup".to_string())
    })?;

    run_transition(
        state,
        order_id,
        Transition::CompletePickup,
        |order| order.payment_method = Some(payment_method),
        |target| async move {
            let patch = OrderPatch {
                payment_method: Some(payment_method),
            };
            state.store.update_fields(order_id, patch).await?;
            state.store.update_status(order_id, target).await
        },
    )
    .await
}

pub async fn cancel(state: &AppState, order_id: Uuid, reason: &str) -> Result<Order, AppError> {
    let reason = machine::validate_cancel_reason(reason)?;

    run_transition(
        state,
        order_id,
        Transition::Cancel,
        |order| order.cancellation_reason = Some(reason.clone()),
        |_| state.store.cancel_order(order_id, &reason),
    )
    .await
}

/// Guards against the last known status, applies the change to the working
/// set, then asks the store. A store failure puts the local copy back.
async fn run_transition<M, R, Fut>(
    state: &AppState,
    order_id: Uuid,
    transition: Transition,
    mutate: M,
    remote: R,
) -> Result<Order, AppError>
where
    M: FnOnce(&mut Order),
    R: FnOnce(OrderStatus) -> Fut,
    Fut: Future<Output = Result<Order, StoreError>>,
{
    let current = state.order(order_id)?;
    let target = match machine::next_status(&current, transition) {
        Ok(target) => target,
        Err(err) => {
            record(state, transition, "rejected_locally");
            return Err(err);
        }
    };

    if let Some(mut order) = state.orders.get_mut(&order_id) {
        order.status = target;
        mutate(&mut *order);
    }

    match remote(target).await {
        Ok(confirmed) => {
            state.orders.insert(order_id, confirmed.clone());
            record(state, transition, "success");
            info!(
                order_id = %order_id,
                code = %confirmed.code,
                %transition,
                status = %confirmed.status,
                "order transitioned"
            );

            state.publish(DispatchEvent::OrderTransitioned {
                order_id,
                transition,
                status: confirmed.status,
            });
            request_print(state, &confirmed, transition);

            Ok(confirmed)
        }
        Err(err) => {
            // Only undo our own edit; a poll may already have replaced it.
            if let Some(mut order) = state.orders.get_mut(&order_id) {
                if order.status == target {
                    *order = current;
                }
            }

            let outcome = match err {
                StoreError::Rejected(_) => "rejected",
                _ => "failed",
            };
            record(state, transition, outcome);
            warn!(order_id = %order_id, %transition, error = %err, "order store refused transition");

            Err(err.into())
        }
    }
}

fn request_print(state: &AppState, order: &Order, transition: Transition) {
    let settings = state.settings();
    let (request, event) = state.print.on_transition(order, transition, &settings.printing);

    if request != PrintRequest::NotPrintable {
        state
            .metrics
            .print_jobs_total
            .with_label_values(&[request.as_str()])
            .inc();
    }
    if let Some(event) = event {
        state.publish(event);
    }
}

fn record(state: &AppState, transition: Transition, outcome: &str) {
    state
        .metrics
        .transitions_total
        .with_label_values(&[transition.as_str(), outcome])
        .inc();
}
