use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberFailure {
    pub order_id: Uuid,
    pub error: String,
}

/// Outcome of a fan-out where every member succeeds or fails on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<MemberFailure>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn any_succeeded(&self) -> bool {
        !self.succeeded.is_empty()
    }
}
