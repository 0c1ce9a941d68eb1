// Process configuration, read from environment variables

use crate::hotel_store::{IdStrategy, StoreConfig};
use crate::places_client::{PlacesQuery, ProviderConfig};

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub store: StoreConfig,
    pub provider: ProviderConfig,
    pub places_query: PlacesQuery,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store: StoreConfig::default(),
            provider: ProviderConfig::default(),
            places_query: PlacesQuery::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Build from any key lookup; unset or unparsable values keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(get("PORT"), "PORT", defaults.port);

        let id_strategy = match get("HOTEL_ID_STRATEGY") {
            Some(raw) => raw.parse::<IdStrategy>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring HOTEL_ID_STRATEGY");
                defaults.store.id_strategy
            }),
            None => defaults.store.id_strategy,
        };
        let seed_hotels = parse_or(get("SEED_HOTELS"), "SEED_HOTELS", defaults.store.seed_hotels);

        let provider = ProviderConfig {
            base_url: get("GEOAPIFY_BASE_URL").unwrap_or(defaults.provider.base_url),
            api_key: get("GEOAPIFY_API_KEY"),
            timeout_ms: parse_or(
                get("GEOAPIFY_TIMEOUT_MS"),
                "GEOAPIFY_TIMEOUT_MS",
                defaults.provider.timeout_ms,
            ),
        };

        let places_query = PlacesQuery {
            limit: parse_or(get("PLACES_LIMIT"), "PLACES_LIMIT", defaults.places_query.limit),
            ..defaults.places_query
        };

        Self {
            port,
            store: StoreConfig {
                id_strategy,
                seed_hotels,
            },
            provider,
            places_query,
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, "Invalid value, using default");
            default
        }),
        None => default,
    }
}
