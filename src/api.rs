//! HTTP API: JSON endpoints over the crop calendar, market board, listings,
//! weather and sessions.
//!
//! All shared state is passed in explicitly through [`AppState`]; handlers
//! hold no globals.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    calendar::{CropCalendar, CropTimeline},
    error::AgriMandiError,
    geocoding::{self, GeocodingClient},
    listings::{CropListing, ListingBook, ListingDraft},
    market::{CropQuote, MarketInsight, PriceBoard, Trend},
    models::{CropDefinition, RegionProfile, WeatherReport},
    session::{SessionContext, UserAccount, UserRole},
    weather::WeatherService,
};

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppState {
    pub calendar: CropCalendar,
    pub market: RwLock<PriceBoard>,
    pub listings: RwLock<ListingBook>,
    pub sessions: RwLock<SessionContext>,
    pub weather: WeatherService,
    pub geocoding: GeocodingClient,
}

/// Error wrapper that maps domain errors onto HTTP status codes.
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.downcast_ref::<AgriMandiError>() {
            Some(err @ AgriMandiError::Validation { .. }) => {
                (StatusCode::BAD_REQUEST, err.user_message())
            }
            Some(err @ AgriMandiError::Auth { .. }) => (StatusCode::UNAUTHORIZED, err.user_message()),
            Some(err @ AgriMandiError::Api { .. }) => (StatusCode::BAD_GATEWAY, err.user_message()),
            Some(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.user_message()),
            None => {
                tracing::error!(error = ?self.0, "Unhandled error in API handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
pub struct ApiCrop {
    pub id: String,
    pub name: String,
    pub season: String,
    pub duration: String,
    pub sowing_window: crate::models::MonthWindow,
    pub harvest_window: crate::models::MonthWindow,
    pub profitability: crate::models::Profitability,
    pub difficulty: crate::models::Difficulty,
    pub market_price: crate::models::MarketPriceRange,
}

impl From<&CropDefinition> for ApiCrop {
    fn from(crop: &CropDefinition) -> Self {
        Self {
            id: crop.id.clone(),
            name: crop.name.clone(),
            season: crop.season.clone(),
            duration: crop.duration.clone(),
            sowing_window: crop.sowing_window,
            harvest_window: crop.harvest_window,
            profitability: crop.profitability,
            difficulty: crop.difficulty,
            market_price: crop.market_price.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiQuote {
    pub id: String,
    pub name: String,
    pub current_price: f64,
    pub previous_price: f64,
    pub change_pct: f64,
    pub trend: Trend,
    pub unit: String,
    pub location: String,
}

impl From<&CropQuote> for ApiQuote {
    fn from(quote: &CropQuote) -> Self {
        Self {
            id: quote.id.clone(),
            name: quote.name.clone(),
            current_price: quote.current_price,
            previous_price: quote.previous_price,
            change_pct: quote.change_pct(),
            trend: quote.trend(),
            unit: quote.unit.clone(),
            location: quote.location.clone(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/recommendations", get(get_recommendations))
        .route("/crops", get(get_crops))
        .route("/timeline", get(get_timeline))
        .route("/regions", get(get_regions))
        .route("/prices", get(get_prices))
        .route("/prices/refresh", post(refresh_prices))
        .route("/insights", get(get_insights))
        .route("/weather", get(get_weather))
        .route("/locations", get(search_locations))
        .route("/locations/reverse", get(reverse_location))
        .route("/listings", get(get_listings))
        .route("/listings", post(submit_listing))
        .route("/listings/{id}/accept", post(accept_listing))
        .route("/listings/{id}/reject", post(reject_listing))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .with_state(state)
}

#[derive(Deserialize)]
struct RecommendationQuery {
    region: String,
    month: u8,
}

async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecommendationQuery>,
) -> Result<Json<Vec<ApiCrop>>, ApiError> {
    let crops = state.calendar.recommend(&params.region, params.month)?;
    Ok(Json(crops.into_iter().map(ApiCrop::from).collect()))
}

async fn get_crops(State(state): State<Arc<AppState>>) -> Json<Vec<CropDefinition>> {
    Json(state.calendar.reference().crops().to_vec())
}

async fn get_timeline(State(state): State<Arc<AppState>>) -> Json<Vec<CropTimeline>> {
    Json(state.calendar.timeline())
}

async fn get_regions(State(state): State<Arc<AppState>>) -> Json<Vec<RegionProfile>> {
    Json(state.calendar.reference().regions().to_vec())
}

#[derive(Deserialize)]
struct PriceQuery {
    query: Option<String>,
}

async fn get_prices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceQuery>,
) -> Json<Vec<ApiQuote>> {
    let board = state.market.read().await;
    let quotes = match params.query.as_deref() {
        Some(query) => board.search(query),
        None => board.quotes().iter().collect(),
    };
    Json(quotes.into_iter().map(ApiQuote::from).collect())
}

async fn refresh_prices(State(state): State<Arc<AppState>>) -> Json<Vec<ApiQuote>> {
    let mut board = state.market.write().await;
    board.refresh();
    Json(board.quotes().iter().map(ApiQuote::from).collect())
}

async fn get_insights(State(state): State<Arc<AppState>>) -> Json<Vec<MarketInsight>> {
    let board = state.market.read().await;
    Json(board.insights().to_vec())
}

#[derive(Deserialize)]
struct WeatherQuery {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
struct WeatherResponse {
    report: WeatherReport,
    region: Option<String>,
}

async fn get_weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let region = geocoding::nearest_region(
        state.calendar.reference().regions(),
        params.latitude,
        params.longitude,
    )
    .map(|r| r.id.clone());

    let mut location = crate::models::Location::new(params.latitude, params.longitude);
    if let Some(region_id) = &region {
        location.state = region_id.clone();
    }

    let report = state.weather.report(&location).await?;
    Ok(Json(WeatherResponse { report, region }))
}

#[derive(Deserialize)]
struct LocationQuery {
    name: String,
}

async fn search_locations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocationQuery>,
) -> Result<Json<Vec<crate::models::Location>>, ApiError> {
    let locations = state.geocoding.geocode(&params.name).await?;
    Ok(Json(locations))
}

#[derive(Deserialize)]
struct ReverseQuery {
    latitude: f64,
    longitude: f64,
}

async fn reverse_location(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseQuery>,
) -> Result<Json<crate::models::Location>, ApiError> {
    let location = state
        .geocoding
        .reverse_geocode(params.latitude, params.longitude)
        .await?;
    Ok(Json(location))
}

#[derive(Deserialize)]
struct ListingQuery {
    state: Option<String>,
    pending: Option<bool>,
}

async fn get_listings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingQuery>,
) -> Json<Vec<CropListing>> {
    let book = state.listings.read().await;
    let listings: Vec<CropListing> = match (&params.state, params.pending) {
        (Some(region), _) => book.for_state(region).into_iter().cloned().collect(),
        (None, Some(true)) => book.pending().into_iter().cloned().collect(),
        _ => book.all().to_vec(),
    };
    Json(listings)
}

async fn submit_listing(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ListingDraft>,
) -> Result<(StatusCode, Json<CropListing>), ApiError> {
    let mut book = state.listings.write().await;
    let listing = book.submit(draft)?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn accept_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CropListing>, ApiError> {
    let mut book = state.listings.write().await;
    let listing = book.accept(&id)?.clone();
    Ok(Json(listing))
}

async fn reject_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CropListing>, ApiError> {
    let mut book = state.listings.write().await;
    let listing = book.reject(&id)?.clone();
    Ok(Json(listing))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
    role: UserRole,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let account = sessions.login(&request.email, &request.password, request.role)?;
    Ok(Json(account))
}

#[derive(Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    phone: String,
    password: String,
    role: UserRole,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserAccount>), ApiError> {
    let mut sessions = state.sessions.write().await;
    let account = sessions.register(
        &request.name,
        &request.email,
        &request.phone,
        &request.password,
        request.role,
    )?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    let mut sessions = state.sessions.write().await;
    sessions.logout()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(State(state): State<Arc<AppState>>) -> Result<Json<UserAccount>, ApiError> {
    let sessions = state.sessions.read().await;
    match sessions.current_user() {
        Some(account) => Ok(Json(account.clone())),
        None => Err(AgriMandiError::auth("Not signed in").into()),
    }
}
