// Main library file for the hotel rating service

// Export modules for each part of the service
pub mod api;
pub mod config;
pub mod hotel_store;
pub mod places_client;
pub mod rating;

// Re-export key types for convenience
pub use api::{build_router, AppState, MessageBody};
pub use config::AppConfig;
pub use hotel_store::{
    HotelCollectionService, HotelError, HotelFields, HotelRecord, IdStrategy, StoreConfig,
};
pub use places_client::{
    GeoapifyClient, Place, PlacesProvider, PlacesQuery, ProviderConfig, ProviderError,
};
pub use rating::{RatingSampler, SeededRatingSampler, UniformRatingSampler};
