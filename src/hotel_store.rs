// Hotel collection: the in-memory store behind the /hotels endpoints

use std::{collections::HashSet, str::FromStr, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::places_client::{Place, PlacesProvider, PlacesQuery, ProviderError};
use crate::rating::{round_rating, RatingSampler, UniformRatingSampler};

// Defaults for records imported from the places provider
pub const UNKNOWN_HOTEL_NAME: &str = "Unknown Hotel";
pub const DEFAULT_LOCATION: &str = "Pune";
pub const DEFAULT_CATEGORY: &str = "4 Star";
pub const DEFAULT_PEAK_PERIOD: &str = "Dec - Jan";

#[derive(Error, Debug)]
pub enum HotelError {
    #[error("Required fields are missing: {0}")]
    ValidationError(String),

    #[error("Hotel not found: {0}")]
    NotFoundError(String),

    #[error("No hotels in the collection")]
    EmptyCollection,

    #[error("External service error: {0}")]
    ExternalServiceError(#[from] ProviderError),
}

// Only `id` is guaranteed: an update stores exactly what the body carried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        rename = "peakPeriod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub peak_period: Option<String>,
    // Caller-supplied attributes we don't model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Request body for create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HotelFields {
    pub name: Option<String>,
    pub location: Option<String>,
    pub rating: Option<f64>,
    pub category: Option<String>,
    #[serde(rename = "peakPeriod")]
    pub peak_period: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HotelFields {
    pub fn new(name: impl Into<String>, location: impl Into<String>, rating: f64) -> Self {
        Self {
            name: Some(name.into()),
            location: Some(location.into()),
            rating: Some(rating),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_peak_period(mut self, peak_period: impl Into<String>) -> Self {
        self.peak_period = Some(peak_period.into());
        self
    }

    // Validate required fields without consuming
    fn check_required(&self) -> Result<(), HotelError> {
        let mut missing = Vec::new();

        if self.name.as_deref().map_or(true, str::is_empty) {
            missing.push("name");
        }
        if self.location.as_deref().map_or(true, str::is_empty) {
            missing.push("location");
        }
        if self.rating.map_or(true, |r| r == 0.0 || r.is_nan()) {
            missing.push("rating");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(HotelError::ValidationError(missing.join(", ")))
        }
    }

    fn into_record(mut self, id: u64) -> HotelRecord {
        // The id always comes from the store, never from the body
        self.extra.remove("id");

        HotelRecord {
            id,
            name: self.name,
            location: self.location,
            rating: self.rating,
            category: self.category,
            peak_period: self.peak_period,
            extra: self.extra,
        }
    }
}

// How new ids are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    // Monotonic counter; ids are never reused
    #[default]
    Sequential,
    // `len + 1`; reuses ids after deletions
    CollectionLength,
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(IdStrategy::Sequential),
            "length" | "collection-length" => Ok(IdStrategy::CollectionLength),
            other => Err(format!("unknown id strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub id_strategy: IdStrategy,
    pub seed_hotels: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Sequential,
            seed_hotels: true,
        }
    }
}

pub fn seed_hotels() -> Vec<HotelRecord> {
    vec![
        HotelFields::new("Hotel Sunrise", "Pune", 4.2)
            .with_category("4 Star")
            .with_peak_period("Dec - Jan")
            .into_record(1),
        HotelFields::new("Sea View Resort", "Goa", 4.8)
            .with_category("5 Star")
            .with_peak_period("Nov - Feb")
            .into_record(2),
    ]
}

#[derive(Debug, Default)]
struct HotelCollection {
    records: Vec<HotelRecord>,
    // Highest id handed out so far
    last_id: u64,
}

impl HotelCollection {
    fn next_id(&mut self, strategy: IdStrategy) -> u64 {
        let id = match strategy {
            IdStrategy::Sequential => self.last_id + 1,
            IdStrategy::CollectionLength => self.records.len() as u64 + 1,
        };
        self.last_id = self.last_id.max(id);
        id
    }

    fn push(&mut self, record: HotelRecord) {
        self.last_id = self.last_id.max(record.id);
        self.records.push(record);
    }
}

pub struct HotelCollectionService {
    config: StoreConfig,
    collection: RwLock<HotelCollection>,
    sampler: Arc<dyn RatingSampler>,
}

impl Default for HotelCollectionService {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl HotelCollectionService {
    pub fn new(config: StoreConfig) -> Self {
        let mut collection = HotelCollection::default();
        if config.seed_hotels {
            for record in seed_hotels() {
                collection.push(record);
            }
        }

        Self {
            config,
            collection: RwLock::new(collection),
            sampler: Arc::new(UniformRatingSampler),
        }
    }

    pub fn with_sampler(mut self, sampler: impl RatingSampler + 'static) -> Self {
        self.sampler = Arc::new(sampler);
        self
    }

    pub fn len(&self) -> usize {
        self.collection.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn list(&self) -> Vec<HotelRecord> {
        self.collection.read().records.clone()
    }

    pub fn create(&self, fields: HotelFields) -> Result<HotelRecord, HotelError> {
        fields.check_required()?;

        let mut collection = self.collection.write();
        let id = collection.next_id(self.config.id_strategy);
        let record = fields.into_record(id);
        collection.push(record.clone());

        tracing::info!(id, name = ?record.name, "Hotel created");
        Ok(record)
    }

    // Full replacement: attributes missing from `fields` are dropped
    pub fn update(&self, id: u64, fields: HotelFields) -> Result<HotelRecord, HotelError> {
        let mut collection = self.collection.write();
        let index = collection
            .records
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| HotelError::NotFoundError(id.to_string()))?;

        let record = fields.into_record(id);
        collection.records[index] = record.clone();

        tracing::info!(id, "Hotel replaced");
        Ok(record)
    }

    // Returns how many records were removed; zero is not an error
    pub fn delete(&self, id: u64) -> usize {
        let mut collection = self.collection.write();
        let before = collection.records.len();
        collection.records.retain(|h| h.id != id);
        let removed = before - collection.records.len();

        tracing::info!(id, removed, "Hotel delete");
        removed
    }

    // First record wins on ties; a missing rating never beats a present one
    pub fn highest_rated(&self) -> Result<HotelRecord, HotelError> {
        self.collection
            .read()
            .records
            .iter()
            .reduce(|max, h| match (h.rating, max.rating) {
                (Some(rating), best) if best.map_or(true, |best| rating > best) => h,
                _ => max,
            })
            .cloned()
            .ok_or(HotelError::EmptyCollection)
    }

    // Fetch candidates from the provider and append the ones with new names.
    // A payload of the wrong shape yields an empty result and no mutation.
    pub async fn merge_from_provider(
        &self,
        provider: &dyn PlacesProvider,
        query: &PlacesQuery,
    ) -> Result<Vec<HotelRecord>, HotelError> {
        let places = match provider.fetch_places(query).await {
            Ok(places) => places,
            Err(ProviderError::MalformedPayload(reason)) => {
                tracing::warn!(%reason, "Places provider returned an unexpected payload");
                return Ok(Vec::new());
            }
            Err(err) => {
                tracing::error!(error = %err, "Places provider request failed");
                return Err(err.into());
            }
        };

        Ok(self.merge_places(places))
    }

    // Transform, dedupe by name against the current collection, append.
    // Returns the full collection after the merge.
    pub fn merge_places(&self, places: Vec<Place>) -> Vec<HotelRecord> {
        let mut collection = self.collection.write();

        let base_len = collection.records.len() as u64;
        let existing_names: HashSet<String> =
            collection.records.iter().filter_map(|h| h.name.clone()).collect();

        let fetched = places.len();
        let mut appended = 0;

        for (offset, place) in places.into_iter().enumerate() {
            let name = place
                .name
                .unwrap_or_else(|| UNKNOWN_HOTEL_NAME.to_string());
            // Rating is drawn for every candidate, duplicates included
            let rating = round_rating(self.sampler.sample());

            if existing_names.contains(&name) {
                continue;
            }

            let id = match self.config.id_strategy {
                IdStrategy::Sequential => collection.next_id(IdStrategy::Sequential),
                IdStrategy::CollectionLength => base_len + offset as u64 + 1,
            };

            collection.push(HotelRecord {
                id,
                name: Some(name),
                location: Some(place.city.unwrap_or_else(|| DEFAULT_LOCATION.to_string())),
                rating: Some(rating),
                category: Some(DEFAULT_CATEGORY.to_string()),
                peak_period: Some(DEFAULT_PEAK_PERIOD.to_string()),
                extra: Map::new(),
            });
            appended += 1;
        }

        tracing::info!(fetched, appended, total = collection.records.len(), "Merged places");
        collection.records.clone()
    }
}
