//! Authentication endpoints and session lifecycle.
//!
//! Login, registration and OTP verification persist the returned token and
//! identity into session storage; logout (and any 401 seen by the transport
//! layer) clears them.

use serde_json::json;

use crate::{
    ApiClient, ApiRequest, AuthResponse, Credentials, MessageResponse, ProfileUpdate,
    Registration, Result, UserProfile,
};

impl ApiClient {
    /// `POST /auth/login` — on success the token and user are persisted.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .request_json(ApiRequest::post("/auth/login").json(credentials)?)
            .await?;
        self.store_session(&response);
        Ok(response)
    }

    /// `POST /auth/register` — on success the token and user are persisted.
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .request_json(ApiRequest::post("/auth/register").json(registration)?)
            .await?;
        self.store_session(&response);
        Ok(response)
    }

    /// `POST /auth/verify-otp` — completes an OTP challenge and persists the
    /// resulting session.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<AuthResponse> {
        let body = json!({ "email": email, "otp": otp });
        let response: AuthResponse = self
            .request_json(ApiRequest::post("/auth/verify-otp").json(&body)?)
            .await?;
        self.store_session(&response);
        Ok(response)
    }

    /// Clears the persisted token and cached identity. Local only; the
    /// backend keeps no server-side session.
    pub fn logout(&self) {
        self.session().clear();
    }

    /// Cached identity from session storage, without a network call.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.session().user()
    }

    /// `GET /auth/profile`
    pub async fn profile(&self) -> Result<UserProfile> {
        self.request_json(ApiRequest::get("/auth/profile")).await
    }

    /// `PUT /auth/profile` — refreshes the cached identity on success.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let user: UserProfile = self
            .request_json(ApiRequest::put("/auth/profile").json(update)?)
            .await?;
        self.session().set_user(&user);
        Ok(user)
    }

    /// `POST /auth/forgot-password`
    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse> {
        let body = json!({ "email": email });
        self.request_json(ApiRequest::post("/auth/forgot-password").json(&body)?)
            .await
    }

    /// `POST /auth/reset-password`
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<MessageResponse> {
        let body = json!({ "token": token, "password": new_password });
        self.request_json(ApiRequest::post("/auth/reset-password").json(&body)?)
            .await
    }

    fn store_session(&self, response: &AuthResponse) {
        self.session().set_token(&response.token);
        self.session().set_user(&response.user);
    }
}
