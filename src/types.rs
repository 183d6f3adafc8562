use serde::{Deserialize, Serialize};

/// Catalog product as returned by `GET /products`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in rupees.
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    /// Review count, used as the popularity signal.
    #[serde(default)]
    pub reviews: u32,
    /// Discount percentage applied to the listed price.
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

fn default_true() -> bool {
    true
}

/// Authenticated user identity, also cached in session storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Login/register payload.
#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration payload.
#[derive(Clone, Debug, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Profile fields accepted by `PUT /auth/profile`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Successful login/register/OTP response carrying the session token.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Plain acknowledgment body (`{"message": "..."}`).
#[derive(Clone, Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Order lifecycle states reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    // Older backend builds spell this with spaces.
    #[serde(alias = "out for delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Cart contents submitted to `POST /orders`.
#[derive(Clone, Debug, Serialize)]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Delivery progress for one order.
#[derive(Clone, Debug, Deserialize)]
pub struct OrderTracking {
    pub status: OrderStatus,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
    /// One-time code the customer shows the delivery agent.
    #[serde(default)]
    pub delivery_otp: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Subscription {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub plan: String,
    pub price: f64,
    pub active: bool,
    #[serde(default)]
    pub next_delivery: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewSubscription {
    pub plan: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Payment order request sent to the backend, which forwards it to the
/// gateway. Amount is in paise.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentRequest {
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
}

/// Gateway-side order created by the backend.
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentOrder {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
}

/// Proof of payment handed back by the gateway widget for verification.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentVerification {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}
