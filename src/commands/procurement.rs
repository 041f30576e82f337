//! Delivery tracking and supplier quote request commands.

use chrono::NaiveDate;

use super::{HumanLine, Output, json};
use crate::batch::{BatchSummary, run_batch};
use crate::client::ApiClient;
use crate::models::{
    Delivery, DeliveryPatch, DeliveryStatus, NewDelivery, QuoteLineItem, QuoteRequest, QuoteStatus,
    SupplierQuote,
};
use crate::toast::ToastCenter;
use crate::{Error, Result};

impl Output for Delivery {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{} [{}] {}", self.id, self.status, self.item_name);
        if let Some(ref supplier) = self.supplier {
            out.push_str(&format!(" from {}", supplier));
        }
        match (self.delivered_date, self.expected_date) {
            (Some(date), _) => out.push_str(&format!(", delivered {}", date)),
            (None, Some(date)) => out.push_str(&format!(", expected {}", date)),
            (None, None) => {}
        }
        if let Some(ref tracking) = self.tracking_number {
            out.push_str(&format!("\n    tracking: {}", tracking));
        }
        out
    }
}

fn quote_status_label(status: QuoteStatus) -> &'static str {
    match status {
        QuoteStatus::Sent => "sent",
        QuoteStatus::Received => "received",
        QuoteStatus::Accepted => "accepted",
        QuoteStatus::Declined => "declined",
    }
}

impl HumanLine for SupplierQuote {
    fn human_line(&self) -> String {
        let supplier = self.supplier_name.as_deref().unwrap_or(&self.supplier_email);
        format!(
            "{} [{}] {} ({} item(s))",
            self.id,
            quote_status_label(self.status),
            supplier,
            self.items.len()
        )
    }
}

impl Output for SupplierQuote {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.human_line()
    }
}

pub async fn delivery_list(
    client: &ApiClient,
    project_id: Option<&str>,
    status: Option<DeliveryStatus>,
) -> Result<Vec<Delivery>> {
    let mut deliveries = client.list_deliveries(project_id).await?;
    if let Some(status) = status {
        deliveries.retain(|d| d.status == status);
    }
    Ok(deliveries)
}

pub async fn delivery_create(client: &ApiClient, delivery: NewDelivery) -> Result<Delivery> {
    if delivery.item_name.trim().is_empty() {
        return Err(Error::InvalidInput("Item name cannot be empty".to_string()));
    }
    Ok(client.create_delivery(&delivery).await?)
}

/// Apply a patch to a delivery. Any status may be set from any other.
pub async fn delivery_update(client: &ApiClient, delivery_id: &str, patch: DeliveryPatch) -> Result<Delivery> {
    if patch.is_empty() {
        return Err(Error::InvalidInput(
            "Nothing to update: pass --status, --tracking, --expected, --delivered or --notes"
                .to_string(),
        ));
    }
    Ok(client.update_delivery(delivery_id, &patch).await?)
}

/// Convenience for building a patch from optional CLI values.
pub fn delivery_patch(
    status: Option<DeliveryStatus>,
    tracking_number: Option<String>,
    expected_date: Option<NaiveDate>,
    delivered_date: Option<NaiveDate>,
    notes: Option<String>,
) -> DeliveryPatch {
    DeliveryPatch {
        status,
        tracking_number,
        expected_date,
        delivered_date,
        notes,
    }
}

pub async fn rfq_list(client: &ApiClient) -> Result<Vec<SupplierQuote>> {
    Ok(client.list_supplier_quotes().await?)
}

/// Send one quote request per supplier; a failed supplier does not stop the rest.
pub async fn rfq_send(
    client: &ApiClient,
    suppliers: Vec<String>,
    items: Vec<QuoteLineItem>,
    project_id: Option<String>,
    message: Option<String>,
    toasts: &mut ToastCenter,
) -> Result<BatchSummary<SupplierQuote>> {
    if items.is_empty() {
        return Err(Error::InvalidInput("A quote request needs at least one item".to_string()));
    }

    let requests: Vec<QuoteRequest> = suppliers
        .into_iter()
        .map(|email| QuoteRequest {
            project_id: project_id.clone(),
            supplier_email: email.trim().to_string(),
            items: items.clone(),
            message: message.clone(),
        })
        .collect();

    let summary = run_batch(
        requests,
        |r| r.supplier_email.clone(),
        move |request| async move { client.send_supplier_quote(&request).await },
    )
    .await;

    let id = toasts.next_id();
    toasts.push(summary.to_toast(id, "Sent", "quote request"));
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_human() {
        let delivery = Delivery {
            id: "d1".to_string(),
            project_id: "p1".to_string(),
            item_name: "Oak dining table".to_string(),
            supplier: Some("Nordic Furniture".to_string()),
            status: DeliveryStatus::InTransit,
            tracking_number: Some("1Z999".to_string()),
            expected_date: NaiveDate::from_ymd_opt(2024, 6, 3),
            delivered_date: None,
            notes: None,
        };
        let human = delivery.to_human();
        assert!(human.starts_with("d1 [IN_TRANSIT] Oak dining table from Nordic Furniture, expected 2024-06-03"));
        assert!(human.contains("tracking: 1Z999"));
    }

    #[test]
    fn test_delivery_patch_builder() {
        assert!(delivery_patch(None, None, None, None, None).is_empty());
        assert!(!delivery_patch(Some(DeliveryStatus::Delayed), None, None, None, None).is_empty());
    }
}
