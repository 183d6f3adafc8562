//! `picklecart-api` is an async client for the PickleCart storefront REST API.
//!
//! All calls go through one resilience pipeline: requests are spaced by a
//! shared throttle gate, carry the persisted bearer token, back off on 429
//! using the server's `retry-after`, retry transport failures against a
//! bounded per-call budget, and clear the session on 401.
//!
//! ```no_run
//! use picklecart_api::{ApiClient, Credentials};
//!
//! # async fn run() -> picklecart_api::Result<()> {
//! let api = ApiClient::new("https://api.picklecart.example")
//!     .on_session_expired(|| println!("send the user to the login page"));
//!
//! api.login(&Credentials {
//!     email: "kit@example.com".into(),
//!     password: "hunter2".into(),
//! })
//! .await?;
//!
//! let products = api.products().await?;
//! println!("{} products", products.len());
//! # Ok(())
//! # }
//! ```

mod auth;
mod catalog;
mod client;
mod error;
mod options;
mod orders;
mod payments;
mod request;
mod session;
mod throttle;
mod types;

pub use catalog::{ProductFilter, SortBy};
pub use client::{ApiClient, SessionExpiredHook};
pub use error::ApiError;
pub use options::ClientOptions;
pub use payments::CheckoutOptions;
pub use request::ApiRequest;
pub use session::{MemorySessionStore, Session, SessionStore, TOKEN_KEY, USER_KEY};
pub use types::{
    AuthResponse, Credentials, MessageResponse, NewOrder, NewSubscription, Order, OrderItem,
    OrderStatus, OrderTracking, PaymentOrder, PaymentRequest, PaymentVerification, Product,
    ProfileUpdate, Registration, Subscription, UserProfile,
};

pub type Result<T> = std::result::Result<T, ApiError>;
