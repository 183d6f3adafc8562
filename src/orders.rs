//! Order and subscription endpoints.

use crate::{
    ApiClient, ApiRequest, MessageResponse, NewOrder, NewSubscription, Order, OrderTracking,
    Result, Subscription,
};

impl ApiClient {
    /// `GET /orders` — the authenticated user's order history.
    pub async fn orders(&self) -> Result<Vec<Order>> {
        self.request_json(ApiRequest::get("/orders")).await
    }

    /// `POST /orders` — places an order from the submitted cart.
    pub async fn place_order(&self, order: &NewOrder) -> Result<Order> {
        self.request_json(ApiRequest::post("/orders").json(order)?)
            .await
    }

    /// `POST /orders/{id}/cancel`
    pub async fn cancel_order(&self, id: &str) -> Result<Order> {
        self.request_json(ApiRequest::post(format!("/orders/{id}/cancel")))
            .await
    }

    /// `GET /orders/{id}/tracking` — delivery progress, including the
    /// delivery OTP once the order is out for delivery.
    pub async fn track_order(&self, id: &str) -> Result<OrderTracking> {
        self.request_json(ApiRequest::get(format!("/orders/{id}/tracking")))
            .await
    }

    /// `GET /subscriptions`
    pub async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        self.request_json(ApiRequest::get("/subscriptions")).await
    }

    /// `POST /subscriptions`
    pub async fn subscribe(&self, subscription: &NewSubscription) -> Result<Subscription> {
        self.request_json(ApiRequest::post("/subscriptions").json(subscription)?)
            .await
    }

    /// `POST /subscriptions/{id}/cancel`
    pub async fn cancel_subscription(&self, id: &str) -> Result<MessageResponse> {
        self.request_json(ApiRequest::post(format!("/subscriptions/{id}/cancel")))
            .await
    }
}
