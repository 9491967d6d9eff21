//! API client for communicating with the monitoring REST API.
//!
//! This module provides the `ApiClient` struct. Every call goes through
//! `ApiClient::request`, which attaches the stored access token and, on a
//! 401, refreshes the token and re-sends the call at most once.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::config::Config;
use crate::models::{Alert, AlertPage, AlertsSummary, Camera, Device, UserProfile};

use super::query::QueryParams;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserProfile>,
}

/// Successful response body.
///
/// JSON content types are parsed; anything else is handed back as text.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(serde_json::Value),
    Text(String),
}

impl ApiResponse {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ApiResponse::Text(text) => Some(text),
            ApiResponse::Json(_) => None,
        }
    }

    /// Decode into a model. Text bodies are accepted if they hold JSON.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Json(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::InvalidResponse(e.to_string())),
            ApiResponse::Text(text) => serde_json::from_str(&text).map_err(|_| {
                ApiError::InvalidResponse("expected a JSON body, got text".to_string())
            }),
        }
    }
}

/// Method, body and extra headers for one call. Defaults to a bare GET.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<String>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Serialize `payload` as the JSON request body
    pub fn with_json<T: Serialize + ?Sized>(mut self, payload: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// API client for the monitoring backend.
/// Clone is cheap - the store and transport are shared behind `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    /// Create a client that sends requests over HTTP with the given timeout
    pub fn new(
        base_url: &str,
        store: Arc<dyn TokenStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(timeout)?;
        Ok(Self::with_transport(base_url, store, Arc::new(transport)))
    }

    pub fn from_config(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        Self::new(
            &config.api_base,
            store,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_transport(
        base_url: &str,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Token State =====

    /// Read a token; storage failures read as "no token"
    fn stored_token(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read token from store");
                None
            }
        }
    }

    /// Persist a token. Empty or missing values leave the stored one alone.
    fn store_token(&self, key: &str, value: Option<&str>) -> Result<(), ApiError> {
        match value.filter(|v| !v.is_empty()) {
            Some(token) => self
                .store
                .set(key, token)
                .map_err(|e| ApiError::Storage(e.to_string())),
            None => Ok(()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.stored_token(ACCESS_TOKEN_KEY).is_some()
    }

    /// Forget both tokens. Local only, safe to call repeatedly.
    pub fn logout(&self) -> Result<(), ApiError> {
        // Both removals are attempted even if the first fails
        let access = self.store.remove(ACCESS_TOKEN_KEY);
        let refresh = self.store.remove(REFRESH_TOKEN_KEY);
        access
            .and(refresh)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        info!("Logged out");
        Ok(())
    }

    fn bearer(token: &str) -> Option<HeaderValue> {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                Some(value)
            }
            Err(_) => {
                warn!("Stored token is not a valid header value; sending without it");
                None
            }
        }
    }

    /// JSON content type, then caller headers (which may replace it),
    /// then the bearer token if one is stored.
    fn build_headers(&self, options: &RequestOptions) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        );
        headers.extend(options.headers.clone());

        if let Some(value) = self
            .stored_token(ACCESS_TOKEN_KEY)
            .and_then(|token| Self::bearer(&token))
        {
            headers.insert(header::AUTHORIZATION, value);
        }
        headers
    }

    async fn send(&self, path: &str, options: &RequestOptions) -> Result<HttpResponse, ApiError> {
        let request = HttpRequest {
            method: options.method.clone(),
            url: self.url(path),
            headers: self.build_headers(options),
            body: options.body.clone(),
        };
        debug!(method = %request.method, path = path, "Sending request");
        let response = self.transport.send(request).await?;
        debug!(path = path, status = response.status, "Received response");
        Ok(response)
    }

    fn into_result(response: HttpResponse) -> Result<ApiResponse, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }
        if response.is_json() {
            serde_json::from_str(&response.body)
                .map(ApiResponse::Json)
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))
        } else {
            Ok(ApiResponse::Text(response.body))
        }
    }

    /// Perform one API call.
    ///
    /// A 401 with `allow_retry` set and a refresh token on hand triggers a
    /// token refresh; if that works the call is sent once more and that
    /// outcome is final. Otherwise the original 401 is returned as an error.
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
        allow_retry: bool,
    ) -> Result<ApiResponse, ApiError> {
        let response = self.send(path, &options).await?;

        if response.status == 401
            && allow_retry
            && self.stored_token(REFRESH_TOKEN_KEY).is_some()
        {
            if self.refresh_access_token().await {
                debug!(path = path, "Access token refreshed, retrying once");
                let retried = self.send(path, &options).await?;
                return Self::into_result(retried);
            }
            warn!(path = path, "Token refresh failed");
        }

        Self::into_result(response)
    }

    /// Exchange the refresh token for a new access token.
    /// Returns false on any failure; stored tokens are only touched on success.
    /// A JSON success body without a token still counts as refreshed.
    async fn refresh_access_token(&self) -> bool {
        let Some(refresh_token) = self.stored_token(REFRESH_TOKEN_KEY) else {
            debug!("No refresh token stored");
            return false;
        };
        let Some(bearer) = Self::bearer(&refresh_token) else {
            return false;
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, bearer);
        let request = HttpRequest {
            method: Method::POST,
            url: self.url(REFRESH_PATH),
            headers,
            body: None,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh request failed");
                return false;
            }
        };
        if !response.is_success() {
            warn!(status = response.status, "Token refresh rejected");
            return false;
        }

        // Any JSON body counts as success; a missing token keeps the stored one
        let body: serde_json::Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Token refresh response is not JSON");
                return false;
            }
        };
        let new_token = body.get("access_token").and_then(|t| t.as_str());
        if new_token.map_or(true, str::is_empty) {
            debug!("Token refresh response has no access token");
        }

        match self.store_token(ACCESS_TOKEN_KEY, new_token) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to store refreshed access token");
                false
            }
        }
    }

    /// Log in and store the returned tokens.
    /// A failed login never attempts a token refresh.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, ApiError> {
        let options = RequestOptions::post().with_json(&LoginRequest { username, password })?;
        let data: LoginResponse = self.request(LOGIN_PATH, options, false).await?.decode()?;

        self.store_token(ACCESS_TOKEN_KEY, data.access_token.as_deref())?;
        self.store_token(REFRESH_TOKEN_KEY, data.refresh_token.as_deref())?;

        let user = data
            .user
            .ok_or_else(|| ApiError::InvalidResponse("login response has no user".to_string()))?;
        info!(username = %user.username, "Logged in");
        Ok(user)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestOptions::get(), true).await?.decode()
    }

    async fn send_json<P: Serialize + ?Sized>(
        &self,
        options: RequestOptions,
        path: &str,
        payload: &P,
    ) -> Result<ApiResponse, ApiError> {
        self.request(path, options.with_json(payload)?, true).await
    }

    async fn action(&self, method: Method, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(path, RequestOptions::new(method), true).await
    }

    // ===== Users =====

    pub async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        self.get("/auth/profile").await
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, ApiError> {
        self.get("/auth/users").await
    }

    pub async fn get_user(&self, id: i64) -> Result<UserProfile, ApiError> {
        self.get(&format!("/auth/users/{}", id)).await
    }

    pub async fn create_user<P: Serialize + ?Sized>(&self, payload: &P) -> Result<ApiResponse, ApiError> {
        self.send_json(RequestOptions::post(), "/auth/users", payload).await
    }

    pub async fn update_user<P: Serialize + ?Sized>(
        &self,
        id: i64,
        payload: &P,
    ) -> Result<ApiResponse, ApiError> {
        self.send_json(RequestOptions::put(), &format!("/auth/users/{}", id), payload)
            .await
    }

    pub async fn delete_user(&self, id: i64) -> Result<ApiResponse, ApiError> {
        self.request(&format!("/auth/users/{}", id), RequestOptions::delete(), true).await
    }

    // ===== Devices =====

    pub async fn list_devices(&self) -> Result<Vec<Device>, ApiError> {
        self.get("/devices/").await
    }

    pub async fn get_device(&self, id: i64) -> Result<Device, ApiError> {
        self.get(&format!("/devices/{}", id)).await
    }

    pub async fn create_device<P: Serialize + ?Sized>(&self, payload: &P) -> Result<ApiResponse, ApiError> {
        self.send_json(RequestOptions::post(), "/devices/", payload).await
    }

    pub async fn update_device<P: Serialize + ?Sized>(
        &self,
        id: i64,
        payload: &P,
    ) -> Result<ApiResponse, ApiError> {
        self.send_json(RequestOptions::put(), &format!("/devices/{}", id), payload)
            .await
    }

    pub async fn delete_device(&self, id: i64) -> Result<ApiResponse, ApiError> {
        self.request(&format!("/devices/{}", id), RequestOptions::delete(), true).await
    }

    /// Trigger an immediate poll of one device
    pub async fn poll_device(&self, id: i64) -> Result<ApiResponse, ApiError> {
        self.action(Method::POST, &format!("/devices/{}/poll", id)).await
    }

    pub async fn devices_status(&self) -> Result<ApiResponse, ApiError> {
        self.action(Method::GET, "/devices/status").await
    }

    // ===== Cameras =====

    pub async fn list_cameras(&self) -> Result<Vec<Camera>, ApiError> {
        self.get("/cameras/").await
    }

    pub async fn get_camera(&self, id: i64) -> Result<Camera, ApiError> {
        self.get(&format!("/cameras/{}", id)).await
    }

    pub async fn create_camera<P: Serialize + ?Sized>(&self, payload: &P) -> Result<ApiResponse, ApiError> {
        self.send_json(RequestOptions::post(), "/cameras/", payload).await
    }

    pub async fn update_camera<P: Serialize + ?Sized>(
        &self,
        id: i64,
        payload: &P,
    ) -> Result<ApiResponse, ApiError> {
        self.send_json(RequestOptions::put(), &format!("/cameras/{}", id), payload)
            .await
    }

    pub async fn delete_camera(&self, id: i64) -> Result<ApiResponse, ApiError> {
        self.request(&format!("/cameras/{}", id), RequestOptions::delete(), true).await
    }

    /// Stream info; may be JSON or plain text depending on the server
    pub async fn camera_stream(&self, id: i64) -> Result<ApiResponse, ApiError> {
        self.action(Method::GET, &format!("/cameras/{}/stream", id)).await
    }

    pub async fn test_camera(&self, id: i64) -> Result<ApiResponse, ApiError> {
        self.action(Method::POST, &format!("/cameras/{}/test", id)).await
    }

    pub async fn cameras_status(&self) -> Result<ApiResponse, ApiError> {
        self.action(Method::GET, "/cameras/status").await
    }

    // ===== Alerts =====

    /// List alerts, e.g. filtered by `severity`, `acknowledged`, `page`, `per_page`
    pub async fn list_alerts(&self, params: &QueryParams) -> Result<AlertPage, ApiError> {
        self.get(&params.apply("/alerts/")).await
    }

    pub async fn get_alert(&self, id: i64) -> Result<Alert, ApiError> {
        self.get(&format!("/alerts/{}", id)).await
    }

    pub async fn create_alert<P: Serialize + ?Sized>(&self, payload: &P) -> Result<ApiResponse, ApiError> {
        self.send_json(RequestOptions::post(), "/alerts/", payload).await
    }

    pub async fn acknowledge_alert(&self, id: i64) -> Result<ApiResponse, ApiError> {
        self.action(Method::POST, &format!("/alerts/{}/acknowledge", id)).await
    }

    /// Acknowledge every open alert; `payload` may narrow the selection
    pub async fn acknowledge_all_alerts<P: Serialize + ?Sized>(
        &self,
        payload: &P,
    ) -> Result<ApiResponse, ApiError> {
        self.send_json(RequestOptions::post(), "/alerts/acknowledge-all", payload)
            .await
    }

    pub async fn delete_alert(&self, id: i64) -> Result<ApiResponse, ApiError> {
        self.request(&format!("/alerts/{}", id), RequestOptions::delete(), true).await
    }

    pub async fn alerts_summary(&self) -> Result<AlertsSummary, ApiError> {
        self.get("/alerts/summary").await
    }

    // ===== Settings =====

    pub async fn get_settings(&self) -> Result<ApiResponse, ApiError> {
        self.action(Method::GET, "/settings/").await
    }

    pub async fn update_settings<P: Serialize + ?Sized>(
        &self,
        payload: &P,
    ) -> Result<ApiResponse, ApiError> {
        self.send_json(RequestOptions::put(), "/settings/", payload).await
    }

    pub async fn test_email(&self) -> Result<ApiResponse, ApiError> {
        self.action(Method::POST, "/settings/test-email").await
    }

    pub async fn test_slack(&self) -> Result<ApiResponse, ApiError> {
        self.action(Method::POST, "/settings/test-slack").await
    }

    pub async fn restart_polling(&self) -> Result<ApiResponse, ApiError> {
        self.action(Method::POST, "/settings/restart-polling").await
    }

    pub async fn clear_cache(&self) -> Result<ApiResponse, ApiError> {
        self.action(Method::POST, "/settings/clear-cache").await
    }
}
