//! Delivery tracking endpoints.

use reqwest::Method;

use super::{ApiClient, ApiError, segment};
use crate::models::{Delivery, DeliveryPatch, NewDelivery};

impl ApiClient {
    /// List deliveries, optionally only those of one project.
    pub async fn list_deliveries(&self, project_id: Option<&str>) -> Result<Vec<Delivery>, ApiError> {
        match project_id {
            Some(id) => {
                self.get_json_query("/api/deliveries", &[("projectId", id)])
                    .await
            }
            None => self.get_json("/api/deliveries").await,
        }
    }

    pub async fn create_delivery(&self, delivery: &NewDelivery) -> Result<Delivery, ApiError> {
        self.send_json(Method::POST, "/api/deliveries", delivery)
            .await
    }

    pub async fn update_delivery(&self, delivery_id: &str, patch: &DeliveryPatch) -> Result<Delivery, ApiError> {
        let path = format!("/api/deliveries/{}", segment(delivery_id));
        self.send_json(Method::PATCH, &path, patch).await
    }
}
