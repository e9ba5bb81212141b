//! Rental REST API client
//!
//! Reads go through the shared `CacheManager`; successful writes fire the
//! matching invalidation hook so later reads see the server's latest state.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{Booking, Credentials, Mechanic, UserProfile, Vehicle};
use crate::cache::{
    cached, mechanic_key, vehicle_key, CacheManager, Clock, SystemClock, BOOKINGS_KEY,
    MECHANICS_KEY, USER_PROFILE_KEY, VEHICLES_KEY,
};
use crate::cli::ClientConfig;
use crate::data::token::is_token_expired;

/// Errors that can occur when talking to the rental API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server answered with a non-success status
    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },
}

/// Response body of `POST /auth/login`
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "accessToken")]
    token: String,
}

/// Client for the rental REST API
#[derive(Debug)]
pub struct RentalClient<C: Clock = SystemClock> {
    http_client: Client,
    base_url: String,
    token: Option<String>,
    cache: Arc<CacheManager<Value, C>>,
    /// TTL for cached reads; `None` uses the cache default
    ttl: Option<Duration>,
}

impl RentalClient<SystemClock> {
    /// Creates a client with its own cache using the default TTL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_cache(base_url, Arc::new(CacheManager::new()))
    }

    /// Creates a client from validated CLI configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        let cache = CacheManager::from_config(&config.cache, SystemClock);
        let mut client = Self::with_cache(config.base_url.clone(), Arc::new(cache));
        client.token = config.token.clone();
        client
    }
}

impl<C: Clock> RentalClient<C> {
    /// Creates a client reading through a shared cache
    pub fn with_cache(base_url: impl Into<String>, cache: Arc<CacheManager<Value, C>>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            cache,
            ttl: None,
        }
    }

    /// Sets the bearer token sent with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the TTL for cached reads
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns the cache backing this client
    pub fn cache(&self) -> &Arc<CacheManager<Value, C>> {
        &self.cache
    }

    /// Returns the current bearer token, if any
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns whether a token is held and has not expired
    pub fn is_authenticated(&self) -> bool {
        self.token
            .as_deref()
            .is_some_and(|token| !is_token_expired(token, self.cache.clock()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json(response: Response, url: String) -> Result<Value, ApiError> {
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Rental API returned an error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.authorize(self.http_client.get(&url)).send().await?;
        Self::read_json(response, url).await
    }

    async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!(url = %url, method = %method, "Sending");
        let request = self.http_client.request(method, &url).json(body);
        let response = self.authorize(request).send().await?;
        Self::read_json(response, url).await
    }

    async fn cached_get<T: DeserializeOwned>(&self, key: &str, path: &str) -> Result<T, ApiError> {
        let value = cached(&*self.cache, key, self.ttl, || self.get_json(path)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetches all vehicles (cached under `vehicles`)
    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, ApiError> {
        self.cached_get(VEHICLES_KEY, "vehicles").await
    }

    /// Fetches one vehicle (cached under `vehicle_{id}`)
    pub async fn get_vehicle(&self, id: &str) -> Result<Vehicle, ApiError> {
        self.cached_get(&vehicle_key(id), &format!("vehicles/{}", id))
            .await
    }

    /// Fetches all mechanics (cached under `mechanics`)
    pub async fn list_mechanics(&self) -> Result<Vec<Mechanic>, ApiError> {
        self.cached_get(MECHANICS_KEY, "mechanics").await
    }

    /// Fetches one mechanic (cached under `mechanic_{id}`)
    pub async fn get_mechanic(&self, id: &str) -> Result<Mechanic, ApiError> {
        self.cached_get(&mechanic_key(id), &format!("mechanics/{}", id))
            .await
    }

    /// Fetches the current user's bookings (cached under `bookings`)
    pub async fn list_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        self.cached_get(BOOKINGS_KEY, "bookings").await
    }

    /// Fetches the signed-in user's profile (cached under `user_profile`)
    pub async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        self.cached_get(USER_PROFILE_KEY, "users/profile").await
    }

    /// Writes a vehicle and invalidates its cached reads
    ///
    /// The cache is left untouched if the request fails.
    pub async fn update_vehicle(&self, id: &str, vehicle: &Vehicle) -> Result<(), ApiError> {
        self.send_json(Method::PUT, &format!("vehicles/{}", id), vehicle)
            .await?;
        self.cache.on_vehicle_update(id);
        Ok(())
    }

    /// Writes a mechanic and invalidates its cached reads
    pub async fn update_mechanic(&self, id: &str, mechanic: &Mechanic) -> Result<(), ApiError> {
        self.send_json(Method::PUT, &format!("mechanics/{}", id), mechanic)
            .await?;
        self.cache.on_mechanic_update(id);
        Ok(())
    }

    /// Creates a booking and invalidates the cached booking list
    ///
    /// Returns the booking as stored by the server.
    pub async fn create_booking(&self, booking: &Booking) -> Result<Booking, ApiError> {
        let value = self.send_json(Method::POST, "bookings", booking).await?;
        self.cache.on_booking_update();
        Ok(serde_json::from_value(value)?)
    }

    /// Signs in, keeps the returned token, and drops cached data from any previous session
    pub async fn login(&mut self, credentials: &Credentials) -> Result<String, ApiError> {
        let value = self
            .send_json(Method::POST, "auth/login", credentials)
            .await?;
        let LoginResponse { token } = serde_json::from_value(value)?;
        self.cache.on_login();
        self.token = Some(token.clone());
        info!(email = %credentials.email, "Logged in");
        Ok(token)
    }

    /// Forgets the token and empties the cache
    pub fn logout(&mut self) {
        self.token = None;
        self.cache.on_logout();
        info!("Logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, ManualClock};
    use serde_json::json;

    /// Base URL on a port the OS just handed out and released, so nothing listens there
    fn unreachable_base_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}/api/", port)
    }

    fn create_test_client() -> RentalClient<ManualClock> {
        let cache = Arc::new(CacheManager::with_clock(ManualClock::default()));
        RentalClient::with_cache(unreachable_base_url(), cache)
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let cache = Arc::new(CacheManager::with_clock(ManualClock::default()));
        let client = RentalClient::with_cache("http://localhost:4000/api/", cache);
        assert_eq!(client.url("vehicles"), "http://localhost:4000/api/vehicles");
        assert_eq!(client.url("/vehicles/42"), "http://localhost:4000/api/vehicles/42");
    }

    #[test]
    fn test_from_config_applies_token_and_ttl() {
        let config = ClientConfig {
            base_url: "http://localhost:4000".to_string(),
            token: Some("abc".to_string()),
            cache: CacheConfig {
                default_ttl: Duration::from_secs(30),
            },
        };

        let client = RentalClient::from_config(&config);

        assert_eq!(client.token(), Some("abc"));
        assert_eq!(client.cache().default_ttl(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_list_vehicles_served_from_cache_without_network() {
        let client = create_test_client();
        client.cache().set(
            VEHICLES_KEY,
            json!([{ "id": "car1", "make": "Toyota", "model": "Yaris" }]),
            None,
        );

        let vehicles = client.list_vehicles().await.unwrap();

        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].id, "car1");
    }

    #[tokio::test]
    async fn test_get_profile_served_from_cache() {
        let client = create_test_client();
        client.cache().set(
            USER_PROFILE_KEY,
            json!({ "id": "u1", "name": "Ada", "email": "ada@example.com", "role": "admin" }),
            None,
        );

        let profile = client.get_profile().await.unwrap();

        assert_eq!(profile.name, "Ada");
    }

    #[tokio::test]
    async fn test_cached_value_with_wrong_shape_is_parse_error() {
        let client = create_test_client();
        client
            .cache()
            .set(MECHANICS_KEY, json!({ "unexpected": true }), None);

        let result = client.list_mechanics().await;

        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_cache_untouched() {
        let client = create_test_client();
        client.cache().set(VEHICLES_KEY, json!([]), None);
        client.cache().set(vehicle_key("42"), json!({}), None);
        let vehicle = Vehicle {
            id: "42".to_string(),
            make: "Ford".to_string(),
            model: "Focus".to_string(),
            year: None,
            license_plate: None,
            daily_rate: None,
            status: Default::default(),
            vendor_id: None,
        };

        let result = client.update_vehicle("42", &vehicle).await;

        assert!(matches!(result, Err(ApiError::Request(_))));
        assert!(client.cache().has(VEHICLES_KEY));
        assert!(client.cache().has("vehicle_42"));
    }

    #[test]
    fn test_logout_clears_token_and_cache() {
        let mut client = create_test_client().with_token("abc");
        client.cache().set("anything", json!(1), None);

        client.logout();

        assert!(client.token().is_none());
        assert!(client.cache().is_empty());
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_malformed_token_is_not_authenticated() {
        let client = create_test_client().with_token("not-a-jwt");
        assert!(!client.is_authenticated());
    }
}
