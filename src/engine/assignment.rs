use std::collections::BTreeSet;
use std::future::Future;

use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::transitions;
use crate::error::AppError;
use crate::models::batch::{BatchReport, MemberFailure};
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// Ready delivery orders of the dispatch desk are the only ones a courier can take.
pub fn is_selectable(order: &Order) -> bool {
    order.status == OrderStatus::Ready && !order.is_pickup() && order.belongs_to_dispatch()
}

/// Adds or removes `order_id` from the operator's hand-off selection.
pub fn toggle_selection(state: &AppState, order_id: Uuid) -> Result<bool, AppError> {
    let selected = state.view.selection().order_ids.contains(&order_id);
    if !selected {
        let order = state.order(order_id)?;
        if !is_selectable(&order) {
            return Err(AppError::Validation(format!(
                "order {} is not a ready delivery order",
                order.code
            )));
        }
    }

    Ok(state.view.toggle_order(order_id))
}

/// Hands every order in `order_ids` to one courier. Members run concurrently
/// and independently; there is no rollback when some of them fail.
pub async fn assign_batch(
    state: &AppState,
    courier_id: Option<Uuid>,
    order_ids: &BTreeSet<Uuid>,
) -> Result<BatchReport, AppError> {
    let courier_id =
        courier_id.ok_or_else(|| AppError::Validation("no courier selected".to_string()))?;
    if order_ids.is_empty() {
        return Err(AppError::Validation("no orders selected".to_string()));
    }

    let report = fan_out(order_ids.iter().copied(), |order_id| {
        transitions::assign_courier(state, order_id, courier_id)
    })
    .await;

    info!(
        courier_id = %courier_id,
        assigned = report.succeeded.len(),
        failed = report.failed.len(),
        "batch handed to courier"
    );

    Ok(report)
}

/// Dispatches the view's current selection and clears it once anything went out.
pub async fn dispatch_selection(state: &AppState) -> Result<BatchReport, AppError> {
    let selection = state.view.selection();
    let report = assign_batch(state, selection.courier_id, &selection.order_ids).await?;

    if report.any_succeeded() {
        state.view.clear_orders();
    }

    Ok(report)
}

/// Runs `op` for every id at once and collects per-member outcomes.
pub(crate) async fn fan_out<I, F, Fut>(order_ids: I, op: F) -> BatchReport
where
    I: IntoIterator<Item = Uuid>,
    F: Fn(Uuid) -> Fut,
    Fut: Future<Output = Result<Order, AppError>>,
{
    let calls = order_ids.into_iter().map(|order_id| {
        let call = op(order_id);
        async move { (order_id, call.await) }
    });

    let mut report = BatchReport::default();
    for (order_id, result) in join_all(calls).await {
        match result {
            Ok(_) => report.succeeded.push(order_id),
            Err(err) => {
                warn!(order_id = %order_id, error = %err, "batch member failed");
                report.failed.push(MemberFailure {
                    order_id,
                    error: err.to_string(),
                });
            }
        }
    }

    report
}
