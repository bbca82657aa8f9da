use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use uuid::Uuid;

/// What the operator has picked for the next courier hand-off.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BatchSelection {
    pub courier_id: Option<Uuid>,
    pub order_ids: BTreeSet<Uuid>,
}

/// Presentation state owned by the dispatch view and handed to the engine.
#[derive(Debug, Default)]
pub struct ViewState {
    selection: Mutex<BatchSelection>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> BatchSelection {
        self.lock().clone()
    }

    pub fn select_courier(&self, courier_id: Option<Uuid>) {
        self.lock().courier_id = courier_id;
    }

    /// Adds the order when absent, removes it when present. Returns whether it
    /// is selected afterwards.
    pub fn toggle_order(&self, order_id: Uuid) -> bool {
        let mut selection = self.lock();
        if selection.order_ids.remove(&order_id) {
            false
        } else {
            selection.order_ids.insert(order_id);
            true
        }
    }

    pub fn clear_orders(&self) {
        self.lock().order_ids.clear();
    }

    /// Drops ids that are no longer eligible, e.g. after a sync moved them on.
    pub fn retain_orders(&self, keep: impl Fn(&Uuid) -> bool) {
        self.lock().order_ids.retain(|id| keep(id));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BatchSelection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::ViewState;

    #[test]
    fn toggling_twice_deselects() {
        let view = ViewState::new();
        let id = Uuid::new_v4();

        assert!(view.toggle_order(id));
        assert!(!view.toggle_order(id));
        assert!(view.selection().order_ids.is_empty());
    }

    #[test]
    fn clearing_orders_keeps_the_courier() {
        let view = ViewState::new();
        let courier = Uuid::new_v4();
        view.select_courier(Some(courier));
        view.toggle_order(Uuid::new_v4());

        view.clear_orders();

        let selection = view.selection();
        assert_eq!(selection.courier_id, Some(courier));
        assert!(selection.order_ids.is_empty());
    }
}
