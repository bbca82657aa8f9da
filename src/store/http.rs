use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::courier::{Courier, CourierDetail};
use crate::models::order::{Order, OrderPatch, OrderStatus, SalesChannel};
use crate::models::settings::Settings;
use crate::store::wire::{WireCourierDetail, WireOrder};
use crate::store::OrderStore;

/// Order store reached over its JSON HTTP API.
#[derive(Debug, Clone)]
pub struct HttpOrderStore {
    client: Client,
    base_url: String,
}

impl HttpOrderStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Unavailable(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::handle_response(response).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let response = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::NOT_FOUND => Err(StoreError::NotFound(text)),
                StatusCode::BAD_REQUEST
                | StatusCode::CONFLICT
                | StatusCode::UNPROCESSABLE_ENTITY => Err(StoreError::Rejected(text)),
                _ => Err(StoreError::Unavailable(format!("{status}: {text}"))),
            };
        }

        response.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl OrderStore for HttpOrderStore {
    async fn list_orders(&self, channel: Option<SalesChannel>) -> Result<Vec<Order>, StoreError> {
        let path = match channel {
            Some(channel) => {
                let channel = serde_json::to_value(channel)
                    .ok()
                    .and_then(|value| value.as_str().map(str::to_string))
                    .unwrap_or_default();
                format!("orders?channel={channel}")
            }
            None => "orders".to_string(),
        };

        let orders: Vec<WireOrder> = self.get(&path).await?;
        Ok(orders.into_iter().map(Order::from).collect())
    }

    async fn get_order(&self, id: Uuid) -> Result<Order, StoreError> {
        let order: WireOrder = self.get(&format!("orders/{id}")).await?;
        Ok(order.into())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, StoreError> {
        let order: WireOrder = self
            .send_json(
                reqwest::Method::PATCH,
                &format!("orders/{id}/status"),
                &json!({ "status": status }),
            )
            .await?;
        Ok(order.into())
    }

    async fn update_fields(&self, id: Uuid, patch: OrderPatch) -> Result<Order, StoreError> {
        let order: WireOrder = self
            .send_json(reqwest::Method::PATCH, &format!("orders/{id}"), &patch)
            .await?;
        Ok(order.into())
    }

    async fn cancel_order(&self, id: Uuid, reason: &str) -> Result<Order, StoreError> {
        let order: WireOrder = self
            .send_json(
                reqwest::Method::POST,
                &format!("orders/{id}/cancel"),
                &json!({ "status": OrderStatus::Cancelled, "reason": reason }),
            )
            .await?;
        Ok(order.into())
    }

    async fn assign_courier(&self, id: Uuid, courier_id: Uuid) -> Result<Order, StoreError> {
        let order: WireOrder = self
            .send_json(
                reqwest::Method::POST,
                &format!("orders/{id}/courier"),
                &json!({ "courier_id": courier_id }),
            )
            .await?;
        Ok(order.into())
    }

    async fn list_couriers(&self) -> Result<Vec<Courier>, StoreError> {
        self.get("couriers").await
    }

    async fn get_courier(&self, id: Uuid) -> Result<CourierDetail, StoreError> {
        let detail: WireCourierDetail = self.get(&format!("couriers/{id}")).await?;
        Ok(CourierDetail {
            courier: detail.courier,
            orders: detail.orders.into_iter().map(Order::from).collect(),
        })
    }

    async fn get_settings(&self) -> Result<Settings, StoreError> {
        self.get("settings").await
    }

    async fn update_settings(&self, settings: Settings) -> Result<Settings, StoreError> {
        self.send_json(reqwest::Method::PUT, "settings", &settings)
            .await
    }
}
