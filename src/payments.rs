//! Payment-order creation and verification.
//!
//! The backend brokers the gateway: it creates a gateway-side order, the
//! browser-side checkout widget collects the payment, and the proof comes
//! back here for server verification. The widget itself is outside this
//! crate; [`CheckoutOptions`] is the data handed to it.

use crate::{
    ApiClient, ApiRequest, MessageResponse, PaymentOrder, PaymentRequest, PaymentVerification,
    Result,
};

/// Parameters the hosting application passes to the checkout widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutOptions {
    /// Amount in paise.
    pub amount: u64,
    pub currency: String,
    /// Gateway order id from [`ApiClient::create_payment_order`].
    pub order_id: String,
}

impl CheckoutOptions {
    pub fn from_order(order: &PaymentOrder) -> Self {
        Self {
            amount: order.amount,
            currency: order.currency.clone(),
            order_id: order.id.clone(),
        }
    }
}

impl ApiClient {
    /// `POST /payments/orders` — creates a gateway order for the given
    /// amount. Amount is in paise; the receipt is an idempotency tag.
    pub async fn create_payment_order(&self, request: &PaymentRequest) -> Result<PaymentOrder> {
        self.request_json(ApiRequest::post("/payments/orders").json(request)?)
            .await
    }

    /// `POST /payments/verify` — submits the gateway's payment proof for
    /// server-side signature verification.
    pub async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> Result<MessageResponse> {
        self.request_json(ApiRequest::post("/payments/verify").json(verification)?)
            .await
    }
}
