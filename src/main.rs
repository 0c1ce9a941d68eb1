use std::{net::SocketAddr, sync::Arc};

use hotel_rating_service::{
    build_router, AppConfig, AppState, GeoapifyClient, HotelCollectionService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotel_rating_service=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();

    if config.provider.api_key.is_none() {
        tracing::warn!("GEOAPIFY_API_KEY is not set; /hotels/from-api will answer 500");
    }

    let hotels = Arc::new(HotelCollectionService::new(config.store.clone()));
    let places = Arc::new(GeoapifyClient::new(config.provider.clone())?);

    tracing::info!(
        hotels = hotels.len(),
        id_strategy = ?config.store.id_strategy,
        "Hotel collection ready"
    );

    let app = build_router(AppState {
        hotels,
        places,
        places_query: config.places_query.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Backend running on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
