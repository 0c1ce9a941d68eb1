// Places provider client: candidate hotels from an external places-search API

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub const GEOAPIFY_PLACES_URL: &str = "https://api.geoapify.com/v2/places";
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to fetch data from external API";

// Error types for the places provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API key missing")]
    MissingApiKey,

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

// Provider client configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: GEOAPIFY_PLACES_URL.to_string(),
            api_key: None,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

// What to ask the provider for
#[derive(Debug, Clone, PartialEq)]
pub struct PlacesQuery {
    pub categories: String,
    pub bias: GeoPoint,
    pub limit: u32,
}

impl Default for PlacesQuery {
    fn default() -> Self {
        Self {
            categories: "accommodation.hotel".to_string(),
            // Pune
            bias: GeoPoint {
                lon: 73.8567,
                lat: 18.5204,
            },
            limit: 50,
        }
    }
}

impl PlacesQuery {
    pub fn bias_param(&self) -> String {
        format!("proximity:{},{}", self.bias.lon, self.bias.lat)
    }
}

// A place as returned by the provider, reduced to what we import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Place {
    pub name: Option<String>,
    pub city: Option<String>,
}

impl Place {
    pub fn new(name: Option<&str>, city: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_owned),
            city: city.map(str::to_owned),
        }
    }
}

#[async_trait]
pub trait PlacesProvider: Send + Sync + 'static {
    async fn fetch_places(&self, query: &PlacesQuery) -> Result<Vec<Place>, ProviderError>;
}

// Geoapify places API client
pub struct GeoapifyClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl GeoapifyClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ProviderError::InitError(e.to_string()))?;

        Ok(Self { config, http })
    }

    pub fn query_params(query: &PlacesQuery, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("categories", query.categories.clone()),
            ("bias", query.bias_param()),
            ("limit", query.limit.to_string()),
            ("apiKey", api_key.to_string()),
        ]
    }
}

#[async_trait]
impl PlacesProvider for GeoapifyClient {
    async fn fetch_places(&self, query: &PlacesQuery) -> Result<Vec<Place>, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        tracing::debug!(
            categories = %query.categories,
            bias = %query.bias_param(),
            limit = query.limit,
            "Fetching places"
        );

        let response = self
            .http
            .get(&self.config.base_url)
            .query(&Self::query_params(query, api_key))
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiResponseError {
                status_code: status.as_u16(),
                message: UPSTREAM_FAILURE_MESSAGE.to_string(),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::DecodeError(e.to_string()))?;

        parse_places_payload(&payload)
    }
}

// Pull places out of a GeoJSON feature collection.
// Features without usable properties become empty places.
pub fn parse_places_payload(payload: &Value) -> Result<Vec<Place>, ProviderError> {
    let features = payload
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ProviderError::MalformedPayload(format!("expected a `features` array, got: {payload}"))
        })?;

    Ok(features.iter().map(place_from_feature).collect())
}

fn place_from_feature(feature: &Value) -> Place {
    let properties = feature.get("properties");
    let text = |key: &str| {
        properties
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    Place {
        name: text("name"),
        city: text("city"),
    }
}

// In-process provider for tests and local runs without a key
pub mod mock_provider {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicU16, AtomicU8, AtomicUsize, Ordering};

    #[derive(Debug, Clone, Copy)]
    pub enum ProviderMode {
        Normal,
        MalformedPayload,
        Outage(u16),
        MissingKey,
    }

    pub struct MockPlacesProvider {
        mode: AtomicU8,
        outage_status: AtomicU16,
        request_count: AtomicUsize,
        fail_next_requests: AtomicUsize,
        places: Mutex<Vec<Place>>,
        last_query: Mutex<Option<PlacesQuery>>,
    }

    impl Default for MockPlacesProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockPlacesProvider {
        pub fn new() -> Self {
            Self {
                mode: AtomicU8::new(0),
                outage_status: AtomicU16::new(503),
                request_count: AtomicUsize::new(0),
                fail_next_requests: AtomicUsize::new(0),
                places: Mutex::new(Vec::new()),
                last_query: Mutex::new(None),
            }
        }

        pub fn with_places(places: Vec<Place>) -> Self {
            let provider = Self::new();
            provider.set_places(places);
            provider
        }

        pub fn set_places(&self, places: Vec<Place>) {
            *self.places.lock() = places;
        }

        pub fn set_mode(&self, mode: ProviderMode) {
            let mode_value = match mode {
                ProviderMode::Normal => 0,
                ProviderMode::MalformedPayload => 1,
                ProviderMode::Outage(status) => {
                    self.outage_status.store(status, Ordering::SeqCst);
                    2
                }
                ProviderMode::MissingKey => 3,
            };
            self.mode.store(mode_value, Ordering::SeqCst);
        }

        // Next `count` requests fail with a 503 regardless of mode
        pub fn fail_next_requests(&self, count: usize) {
            self.fail_next_requests.store(count, Ordering::SeqCst);
        }

        pub fn request_count(&self) -> usize {
            self.request_count.load(Ordering::SeqCst)
        }

        pub fn last_query(&self) -> Option<PlacesQuery> {
            self.last_query.lock().clone()
        }
    }

    #[async_trait]
    impl PlacesProvider for MockPlacesProvider {
        async fn fetch_places(&self, query: &PlacesQuery) -> Result<Vec<Place>, ProviderError> {
            self.request_count.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock() = Some(query.clone());

            let fail_count = self.fail_next_requests.load(Ordering::SeqCst);
            if fail_count > 0 {
                self.fail_next_requests
                    .store(fail_count - 1, Ordering::SeqCst);
                return Err(ProviderError::ApiResponseError {
                    status_code: 503,
                    message: "Service temporarily unavailable".to_string(),
                });
            }

            match self.mode.load(Ordering::SeqCst) {
                1 => parse_places_payload(&json!({ "error": "Invalid apiKey" })),
                2 => Err(ProviderError::ApiResponseError {
                    status_code: self.outage_status.load(Ordering::SeqCst),
                    message: UPSTREAM_FAILURE_MESSAGE.to_string(),
                }),
                3 => Err(ProviderError::MissingApiKey),
                _ => Ok(self.places.lock().clone()),
            }
        }
    }
}
