//! Status buckets for the dispatch board. Everything here is a pure function
//! of the order snapshot it is handed.

pub mod state;

use serde::Serialize;

use crate::models::order::{Order, OrderStatus};

pub const BOARD_STATUSES: [OrderStatus; 7] = [
    OrderStatus::AwaitingAcceptance,
    OrderStatus::InProduction,
    OrderStatus::Ready,
    OrderStatus::Bagged,
    OrderStatus::EnRoute,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
];

/// Orders in `status` that belong to the dispatch desk, pickup before
/// delivery, otherwise in the order given.
pub fn projection(orders: &[Order], status: OrderStatus) -> Vec<&Order> {
    let mut bucket: Vec<&Order> = orders
        .iter()
        .filter(|order| order.status == status && order.belongs_to_dispatch())
        .collect();
    bucket.sort_by_key(|order| !order.is_pickup());
    bucket
}

pub fn count(orders: &[Order], status: OrderStatus) -> usize {
    projection(orders, status).len()
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBucket {
    pub status: OrderStatus,
    pub count: usize,
    pub orders: Vec<Order>,
}

pub fn board(orders: &[Order]) -> Vec<StatusBucket> {
    BOARD_STATUSES
        .iter()
        .map(|status| {
            let orders: Vec<Order> = projection(orders, *status).into_iter().cloned().collect();
            StatusBucket {
                status: *status,
                count: orders.len(),
                orders,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::models::order::{DeliveryMode, SalesChannel};

    fn order(code: &str, status: OrderStatus, mode: DeliveryMode, minute: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            code: code.to_string(),
            status,
            mode,
            channel: SalesChannel::Delivery,
            customer_name: "Cliente".to_string(),
            customer_phone: String::new(),
            address: None,
            items: Vec::new(),
            total: 0.0,
            payment_method: None,
            courier_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 19, 18, 0, 0).unwrap()
                + Duration::minutes(minute),
            cancellation_reason: None,
        }
    }

    fn codes(bucket: &[&Order]) -> Vec<String> {
        bucket.iter().map(|order| order.code.clone()).collect()
    }

    #[test]
    fn pickup_orders_lead_and_relative_order_is_kept() {
        let orders = vec![
            order("D1", OrderStatus::Ready, DeliveryMode::Delivery, 0),
            order("P1", OrderStatus::Ready, DeliveryMode::Pickup, 1),
            order("D2", OrderStatus::Ready, DeliveryMode::Delivery, 2),
            order("X", OrderStatus::InProduction, DeliveryMode::Pickup, 3),
            order("P2", OrderStatus::Ready, DeliveryMode::Pickup, 4),
        ];

        let bucket = projection(&orders, OrderStatus::Ready);

        assert_eq!(codes(&bucket), ["P1", "P2", "D1", "D2"]);
    }

    #[test]
    fn repeated_projection_is_identical() {
        let orders = vec![
            order("D1", OrderStatus::Ready, DeliveryMode::Delivery, 0),
            order("P1", OrderStatus::Ready, DeliveryMode::Pickup, 1),
            order("D2", OrderStatus::Ready, DeliveryMode::Delivery, 2),
        ];

        let first = codes(&projection(&orders, OrderStatus::Ready));
        for _ in 0..10 {
            assert_eq!(codes(&projection(&orders, OrderStatus::Ready)), first);
        }
    }

    #[test]
    fn other_sales_channels_are_excluded() {
        let mut dine_in = order("T1", OrderStatus::Ready, DeliveryMode::Pickup, 0);
        dine_in.channel = SalesChannel::DineIn;
        let orders = vec![dine_in, order("D1", OrderStatus::Ready, DeliveryMode::Delivery, 1)];

        assert_eq!(codes(&projection(&orders, OrderStatus::Ready)), ["D1"]);
        assert_eq!(count(&orders, OrderStatus::Ready), 1);
    }

    #[test]
    fn board_has_one_bucket_per_status() {
        let orders = vec![
            order("A", OrderStatus::AwaitingAcceptance, DeliveryMode::Delivery, 0),
            order("B", OrderStatus::AwaitingAcceptance, DeliveryMode::Pickup, 1),
            order("C", OrderStatus::EnRoute, DeliveryMode::Delivery, 2),
        ];

        let board = board(&orders);

        assert_eq!(board.len(), BOARD_STATUSES.len());
        assert_eq!(board[0].count, 2);
        assert_eq!(board[0].orders[0].code, "B");
        assert_eq!(board[4].status, OrderStatus::EnRoute);
        assert_eq!(board[4].count, 1);
        assert_eq!(board[2].count, 0);
    }
}
