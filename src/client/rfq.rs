//! Request-for-quote endpoints.

use reqwest::Method;

use super::{ApiClient, ApiError};
use crate::models::{QuoteRequest, SupplierQuote};

impl ApiClient {
    pub async fn list_supplier_quotes(&self) -> Result<Vec<SupplierQuote>, ApiError> {
        self.get_json("/api/rfq/supplier-quote").await
    }

    /// Send one quote request to one supplier.
    pub async fn send_supplier_quote(&self, request: &QuoteRequest) -> Result<SupplierQuote, ApiError> {
        self.send_json(Method::POST, "/api/rfq/supplier-quote", request)
            .await
    }
}
