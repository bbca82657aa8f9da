mod common;

use std::collections::BTreeSet;

use order_dispatch::engine::assignment::{assign_batch, dispatch_selection, toggle_selection};
use order_dispatch::error::AppError;
use order_dispatch::models::order::{DeliveryMode, OrderStatus};
use order_dispatch::store::memory::StoreCall;

use common::{courier, harness, load, order};

fn assign_calls(call: &StoreCall) -> bool {
    matches!(call, StoreCall::AssignCourier { .. })
}

#[tokio::test]
async fn three_ready_orders_make_three_independent_calls() {
    let h = harness();
    let rider = courier("Carlos", true);
    h.store.insert_courier(rider.clone());
    let orders: Vec<_> = ["#O1", "#O2", "#O3"]
        .iter()
        .map(|code| order(code, OrderStatus::Ready, DeliveryMode::Delivery))
        .collect();
    for o in &orders {
        h.store.insert_order(o.clone());
    }
    load(&h.state).await;

    let selection: BTreeSet<_> = orders.iter().map(|o| o.id).collect();
    let report = assign_batch(&h.state, Some(rider.id), &selection).await.unwrap();

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded.len(), 3);
    assert_eq!(h.store.count_calls(assign_calls), 3);
    for o in &orders {
        let stored = h.store.order(o.id).unwrap();
        assert_eq!(stored.status, OrderStatus::Bagged);
        assert_eq!(stored.courier_id, Some(rider.id));
    }
}

#[tokio::test]
async fn missing_courier_or_empty_selection_issues_nothing() {
    let h = harness();
    let rider = courier("Carlos", true);
    let o = order("#O1", OrderStatus::Ready, DeliveryMode::Delivery);
    h.store.insert_courier(rider.clone());
    h.store.insert_order(o.clone());
    load(&h.state).await;

    let err = assign_batch(&h.state, None, &BTreeSet::from([o.id]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = assign_batch(&h.state, Some(rider.id), &BTreeSet::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(h.store.count_calls(assign_calls), 0);
    assert_eq!(h.state.order(o.id).unwrap().status, OrderStatus::Ready);
}

#[tokio::test]
async fn partial_failure_is_not_rolled_back() {
    let h = harness();
    let rider = courier("Lia", true);
    let ok = order("#O1", OrderStatus::Ready, DeliveryMode::Delivery);
    let refused = order("#O2", OrderStatus::Ready, DeliveryMode::Delivery);
    h.store.insert_courier(rider.clone());
    h.store.insert_order(ok.clone());
    h.store.insert_order(refused.clone());
    h.store.refuse_writes_for(refused.id, "already picked up");
    load(&h.state).await;

    let report = assign_batch(&h.state, Some(rider.id), &BTreeSet::from([ok.id, refused.id]))
        .await
        .unwrap();

    assert_eq!(report.succeeded, vec![ok.id]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].order_id, refused.id);
    assert_eq!(h.store.order(ok.id).unwrap().status, OrderStatus::Bagged);
    assert_eq!(h.state.order(refused.id).unwrap().status, OrderStatus::Ready);
}

#[tokio::test]
async fn only_ready_delivery_orders_are_selectable() {
    let h = harness();
    let ready = order("#O1", OrderStatus::Ready, DeliveryMode::Delivery);
    let pickup = order("#P1", OrderStatus::Ready, DeliveryMode::Pickup);
    let cooking = order("#O2", OrderStatus::InProduction, DeliveryMode::Delivery);
    for o in [&ready, &pickup, &cooking] {
        h.store.insert_order(o.clone());
    }
    load(&h.state).await;

    assert!(toggle_selection(&h.state, ready.id).unwrap());
    assert!(matches!(
        toggle_selection(&h.state, pickup.id),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        toggle_selection(&h.state, cooking.id),
        Err(AppError::Validation(_))
    ));

    assert_eq!(h.state.view.selection().order_ids, BTreeSet::from([ready.id]));
    assert!(!toggle_selection(&h.state, ready.id).unwrap());
}

#[tokio::test]
async fn dispatching_the_selection_clears_it_on_success() {
    let h = harness();
    let rider = courier("Beto", true);
    let a = order("#O1", OrderStatus::Ready, DeliveryMode::Delivery);
    let b = order("#O2", OrderStatus::Ready, DeliveryMode::Delivery);
    h.store.insert_courier(rider.clone());
    h.store.insert_order(a.clone());
    h.store.insert_order(b.clone());
    load(&h.state).await;

    toggle_selection(&h.state, a.id).unwrap();
    toggle_selection(&h.state, b.id).unwrap();

    let err = dispatch_selection(&h.state).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.state.view.selection().order_ids.len(), 2);

    h.state.view.select_courier(Some(rider.id));
    let report = dispatch_selection(&h.state).await.unwrap();

    assert_eq!(report.succeeded.len(), 2);
    let selection = h.state.view.selection();
    assert!(selection.order_ids.is_empty());
    assert_eq!(selection.courier_id, Some(rider.id));
}

#[tokio::test]
async fn sync_drops_orders_that_left_ready_from_the_selection() {
    let h = harness();
    let a = order("#O1", OrderStatus::Ready, DeliveryMode::Delivery);
    h.store.insert_order(a.clone());
    load(&h.state).await;
    toggle_selection(&h.state, a.id).unwrap();

    let mut cancelled = a.clone();
    cancelled.status = OrderStatus::Cancelled;
    cancelled.cancellation_reason = Some("cliente desistiu".to_string());
    h.store.insert_order(cancelled);
    load(&h.state).await;

    assert!(h.state.view.selection().order_ids.is_empty());
}
