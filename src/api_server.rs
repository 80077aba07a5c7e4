// Axum API Server Module
//
// Purpose: REST boundary over the entity store and the recommendation engine.
// Request bodies are typed (serde); malformed JSON is rejected by the extractors
// before any handler runs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use std::sync::Arc;

use crate::error::{self, CareError};
use crate::models::{EntityId, Location, NewLocation, NewPlant, NewReading, Plant, Reading};
use crate::recommendation::{Recommendation, Recommender};
use crate::store::EntityStore;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub recommender: Arc<Recommender>,
}

impl AppState {
    /// State with the standard rule set
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self::with_recommender(store, Recommender::default())
    }

    pub fn with_recommender(store: Arc<dyn EntityStore>, recommender: Recommender) -> Self {
        tracing::info!("Recommendation rules: {:?}", recommender.rules().rule_names());
        Self {
            store,
            recommender: Arc::new(recommender),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Status
        .route("/", get(root))
        .route("/health", get(health_check))

        // Locations
        .route("/api/locations", get(list_locations).post(create_location))
        .route("/api/locations/:id", get(get_location).delete(delete_location))
        .route("/api/locations/:id/plants", get(list_location_plants))

        // Plants
        .route("/api/plants", get(list_plants).post(create_plant))
        .route("/api/plants/:id", get(get_plant).delete(delete_plant))

        // Readings
        .route("/api/plants/:id/readings", get(list_readings).post(create_reading))
        .route("/api/readings/:id", get(get_reading))

        // Recommendations (computed on every request)
        .route("/api/plants/:id/recommendation", get(get_recommendation))

        // Middleware (applied in reverse order)
        .layer(CorsLayer::permissive()) // Allow all origins
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Blocking Store Access
// ============================================================================

/// Runs a store call on tokio's blocking pool.
///
/// Store methods are synchronous and the DuckDB backend holds a mutex across disk
/// I/O, so they must not run on an async worker thread.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&dyn EntityStore) -> error::Result<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(AppError::from)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Plant Care Assistant API is running."
    }))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// === Locations ===

async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, AppError> {
    Ok(Json(with_store(&state, |store| store.list_locations()).await?))
}

async fn create_location(
    State(state): State<AppState>,
    Json(new): Json<NewLocation>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    new.validate()?;
    let location = with_store(&state, move |store| store.create_location(new)).await?;
    tracing::info!("Location {} created", location.id);
    Ok((StatusCode::CREATED, Json(location)))
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<Location>, AppError> {
    Ok(Json(with_store(&state, move |store| store.get_location(id)).await?))
}

async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<serde_json::Value>, AppError> {
    with_store(&state, move |store| store.delete_location(id)).await?;
    tracing::info!("Location {} deleted", id);
    Ok(Json(serde_json::json!({
        "message": format!("Location {} deleted.", id)
    })))
}

async fn list_location_plants(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<Vec<Plant>>, AppError> {
    Ok(Json(with_store(&state, move |store| store.list_plants_at(id)).await?))
}

// === Plants ===

async fn list_plants(State(state): State<AppState>) -> Result<Json<Vec<Plant>>, AppError> {
    Ok(Json(with_store(&state, |store| store.list_plants()).await?))
}

async fn create_plant(
    State(state): State<AppState>,
    Json(new): Json<NewPlant>,
) -> Result<(StatusCode, Json<Plant>), AppError> {
    new.validate()?;
    let plant = with_store(&state, move |store| store.create_plant(new)).await?;
    tracing::info!("Plant {} created at location {}", plant.id, plant.location_id);
    Ok((StatusCode::CREATED, Json(plant)))
}

async fn get_plant(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<Plant>, AppError> {
    Ok(Json(with_store(&state, move |store| store.get_plant(id)).await?))
}

async fn delete_plant(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<serde_json::Value>, AppError> {
    let readings_deleted = with_store(&state, move |store| store.delete_plant(id)).await?;
    tracing::info!("Plant {} deleted ({} readings removed)", id, readings_deleted);
    Ok(Json(serde_json::json!({
        "message": format!("Plant {} deleted.", id),
        "readings_deleted": readings_deleted
    })))
}

// === Readings ===

async fn list_readings(
    State(state): State<AppState>,
    Path(plant_id): Path<EntityId>,
) -> Result<Json<Vec<Reading>>, AppError> {
    Ok(Json(with_store(&state, move |store| store.list_readings(plant_id)).await?))
}

async fn create_reading(
    State(state): State<AppState>,
    Path(plant_id): Path<EntityId>,
    Json(new): Json<NewReading>,
) -> Result<(StatusCode, Json<Reading>), AppError> {
    new.validate()?;
    let reading = with_store(&state, move |store| store.create_reading(plant_id, new)).await?;
    tracing::debug!("Reading {} recorded for plant {}", reading.id, plant_id);
    Ok((StatusCode::CREATED, Json(reading)))
}

async fn get_reading(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<Reading>, AppError> {
    Ok(Json(with_store(&state, move |store| store.get_reading(id)).await?))
}

// === Recommendations ===

async fn get_recommendation(
    State(state): State<AppState>,
    Path(plant_id): Path<EntityId>,
) -> Result<Json<Recommendation>, AppError> {
    let recommender = Arc::clone(&state.recommender);
    let recommendation =
        with_store(&state, move |store| recommender.recommend(store, plant_id)).await?;
    Ok(Json(recommendation))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl From<CareError> for AppError {
    fn from(e: CareError) -> Self {
        let message = e.to_string();
        match e {
            e if e.is_not_found() => AppError::NotFound(message),
            CareError::LocationInUse { .. } => AppError::Conflict(message),
            CareError::InvalidInput(_) => AppError::BadRequest(message),
            _ => {
                tracing::error!("Internal error: {}", message);
                AppError::Internal(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
