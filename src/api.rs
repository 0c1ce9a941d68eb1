// HTTP routes for the hotel collection

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::hotel_store::{HotelCollectionService, HotelError, HotelFields, HotelRecord};
use crate::places_client::{PlacesProvider, PlacesQuery, ProviderError};

#[derive(Clone)]
pub struct AppState {
    pub hotels: Arc<HotelCollectionService>,
    pub places: Arc<dyn PlacesProvider>,
    pub places_query: PlacesQuery,
}

// `{message}` body used for confirmations and errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for HotelError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HotelError::ValidationError(missing) => {
                tracing::debug!(%missing, "Rejected hotel payload");
                (StatusCode::BAD_REQUEST, "Required fields are missing")
            }
            HotelError::NotFoundError(_) => (StatusCode::NOT_FOUND, "Not found"),
            HotelError::EmptyCollection => (StatusCode::NOT_FOUND, "No hotels available"),
            HotelError::ExternalServiceError(err) => {
                tracing::error!(error = %err, "Error fetching external API");
                match err {
                    ProviderError::MissingApiKey => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "API key missing")
                    }
                    ProviderError::ApiResponseError { status_code, .. } => (
                        StatusCode::from_u16(*status_code).unwrap_or(StatusCode::BAD_GATEWAY),
                        "Failed to fetch data from external API",
                    ),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
                }
            }
        };

        (status, Json(MessageBody::new(message))).into_response()
    }
}

type ApiResult<T> = Result<T, HotelError>;

fn body_fields(payload: Result<Json<HotelFields>, JsonRejection>) -> ApiResult<HotelFields> {
    payload
        .map(|Json(fields)| fields)
        .map_err(|rejection| HotelError::ValidationError(rejection.body_text()))
}

async fn list_hotels(State(state): State<AppState>) -> Json<Vec<HotelRecord>> {
    Json(state.hotels.list())
}

async fn create_hotel(
    State(state): State<AppState>,
    payload: Result<Json<HotelFields>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<HotelRecord>)> {
    let hotel = state.hotels.create(body_fields(payload)?)?;
    Ok((StatusCode::CREATED, Json(hotel)))
}

// Ids are numeric; any other path segment simply matches no record
fn parse_id(raw: &str) -> Option<u64> {
    raw.parse().ok()
}

async fn update_hotel(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<HotelFields>, JsonRejection>,
) -> ApiResult<Json<HotelRecord>> {
    let id = parse_id(&raw_id).ok_or(HotelError::NotFoundError(raw_id))?;
    let hotel = state.hotels.update(id, body_fields(payload)?)?;
    Ok(Json(hotel))
}

async fn delete_hotel(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Json<MessageBody> {
    match parse_id(&raw_id) {
        Some(id) => {
            state.hotels.delete(id);
        }
        None => tracing::debug!(%raw_id, "Delete for non-numeric id"),
    }
    Json(MessageBody::new("Deleted"))
}

async fn highest_rated(State(state): State<AppState>) -> ApiResult<Json<HotelRecord>> {
    Ok(Json(state.hotels.highest_rated()?))
}

async fn hotels_from_api(State(state): State<AppState>) -> ApiResult<Json<Vec<HotelRecord>>> {
    let merged = state
        .hotels
        .merge_from_provider(state.places.as_ref(), &state.places_query)
        .await?;
    Ok(Json(merged))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/hotels", get(list_hotels).post(create_hotel))
        .route("/hotels/highest-rating", get(highest_rated))
        .route("/hotels/from-api", get(hotels_from_api))
        .route("/hotels/{id}", put(update_hotel).delete(delete_hotel))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotel_store::StoreConfig;
    use crate::places_client::mock_provider::{MockPlacesProvider, ProviderMode};
    use crate::places_client::Place;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        hotels: Arc<HotelCollectionService>,
        places: Arc<MockPlacesProvider>,
    }

    fn test_app() -> TestApp {
        let hotels =
            Arc::new(HotelCollectionService::new(StoreConfig::default()).with_sampler(|| 4.5));
        let places = Arc::new(MockPlacesProvider::new());
        let router = build_router(AppState {
            hotels: hotels.clone(),
            places: places.clone(),
            places_query: PlacesQuery::default(),
        });

        TestApp {
            router,
            hotels,
            places,
        }
    }

    async fn send(
        app: &TestApp,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    #[tokio::test]
    async fn test_list_hotels() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/hotels", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {
                    "id": 1,
                    "name": "Hotel Sunrise",
                    "location": "Pune",
                    "rating": 4.2,
                    "category": "4 Star",
                    "peakPeriod": "Dec - Jan"
                },
                {
                    "id": 2,
                    "name": "Sea View Resort",
                    "location": "Goa",
                    "rating": 4.8,
                    "category": "5 Star",
                    "peakPeriod": "Nov - Feb"
                }
            ])
        );
    }

    #[tokio::test]
    async fn test_crud_scenario() {
        let app = test_app();

        let (status, created) = send(
            &app,
            Method::POST,
            "/hotels",
            Some(json!({ "name": "Test", "location": "X", "rating": 4.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            created,
            json!({ "id": 3, "name": "Test", "location": "X", "rating": 4.5 })
        );

        let (status, updated) = send(
            &app,
            Method::PUT,
            "/hotels/3",
            Some(json!({ "name": "Test2", "location": "Y", "rating": 4.9 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            updated,
            json!({ "id": 3, "name": "Test2", "location": "Y", "rating": 4.9 })
        );

        let (status, deleted) = send(&app, Method::DELETE, "/hotels/3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted, json!({ "message": "Deleted" }));
        assert_eq!(app.hotels.len(), 2);

        let (status, highest) = send(&app, Method::GET, "/hotels/highest-rating", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(highest["name"], "Sea View Resort");
        assert_eq!(highest["rating"], 4.8);
    }

    #[tokio::test]
    async fn test_create_with_optional_fields() {
        let app = test_app();

        let (status, created) = send(
            &app,
            Method::POST,
            "/hotels",
            Some(json!({
                "name": "Test Hotel",
                "location": "Test City",
                "rating": 4.5,
                "category": "3 Star",
                "peakPeriod": "Jan - Feb"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["category"], "3 Star");
        assert_eq!(created["peakPeriod"], "Jan - Feb");
    }

    #[tokio::test]
    async fn test_create_missing_fields() {
        let app = test_app();

        for body in [
            json!({ "name": "No rating", "location": "X" }),
            json!({ "name": "", "location": "X", "rating": 4.0 }),
            json!({ "name": "Bad rating", "location": "X", "rating": "high" }),
        ] {
            let (status, response) = send(&app, Method::POST, "/hotels", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response, json!({ "message": "Required fields are missing" }));
        }

        assert_eq!(app.hotels.len(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_hotel() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::PUT,
            "/hotels/99",
            Some(json!({ "name": "Ghost", "location": "X", "rating": 4.0 })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Not found" }));
    }

    #[tokio::test]
    async fn test_update_with_partial_body_replaces_record() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::PUT,
            "/hotels/1",
            Some(json!({ "name": "Renamed" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": 1, "name": "Renamed" }));

        let (_, hotels) = send(&app, Method::GET, "/hotels", None).await;
        assert_eq!(hotels[0], json!({ "id": 1, "name": "Renamed" }));
    }

    #[tokio::test]
    async fn test_update_non_numeric_id_is_not_found() {
        let app = test_app();
        let before = app.hotels.list();

        let (status, body) = send(
            &app,
            Method::PUT,
            "/hotels/abc",
            Some(json!({ "name": "Ghost", "location": "X", "rating": 4.0 })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Not found" }));
        assert_eq!(app.hotels.list(), before);
    }

    #[tokio::test]
    async fn test_delete_non_numeric_id_still_confirms() {
        let app = test_app();
        let before = app.hotels.list();

        let (status, body) = send(&app, Method::DELETE, "/hotels/abc", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Deleted" }));
        assert_eq!(app.hotels.list(), before);
    }

    #[tokio::test]
    async fn test_delete_unknown_hotel_still_confirms() {
        let app = test_app();

        let (status, body) = send(&app, Method::DELETE, "/hotels/99", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Deleted" }));
        assert_eq!(app.hotels.len(), 2);
    }

    #[tokio::test]
    async fn test_highest_rating_on_empty_collection() {
        let app = test_app();
        app.hotels.delete(1);
        app.hotels.delete(2);

        let (status, body) = send(&app, Method::GET, "/hotels/highest-rating", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "No hotels available" }));
    }

    #[tokio::test]
    async fn test_from_api_merges_new_names() {
        let app = test_app();
        app.places.set_places(vec![
            Place::new(Some("Hotel Sunrise"), Some("Pune")),
            Place::new(Some("Hyatt Regency"), None),
        ]);

        let (status, body) = send(&app, Method::GET, "/hotels/from-api", None).await;

        assert_eq!(status, StatusCode::OK);
        let hotels = body.as_array().unwrap();
        assert_eq!(hotels.len(), 3);
        assert_eq!(
            hotels[2],
            json!({
                "id": 3,
                "name": "Hyatt Regency",
                "location": "Pune",
                "rating": 4.5,
                "category": "4 Star",
                "peakPeriod": "Dec - Jan"
            })
        );
        assert_eq!(app.places.request_count(), 1);
    }

    #[tokio::test]
    async fn test_from_api_malformed_payload_returns_empty_list() {
        let app = test_app();
        app.places.set_mode(ProviderMode::MalformedPayload);

        let (status, body) = send(&app, Method::GET, "/hotels/from-api", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        assert_eq!(app.hotels.len(), 2);
    }

    #[tokio::test]
    async fn test_from_api_errors() {
        let app = test_app();

        app.places.set_mode(ProviderMode::MissingKey);
        let (status, body) = send(&app, Method::GET, "/hotels/from-api", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "API key missing" }));

        app.places.set_mode(ProviderMode::Outage(429));
        let (status, body) = send(&app, Method::GET, "/hotels/from-api", None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body,
            json!({ "message": "Failed to fetch data from external API" })
        );

        assert_eq!(app.hotels.len(), 2);
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let app = test_app();
        let request = Request::builder()
            .uri("/hotels")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
