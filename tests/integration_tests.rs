//! Integration tests exercising the crop calendar, market board, listings
//! and the HTTP API surface end to end, without touching the network.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tokio::sync::RwLock;
use tower::ServiceExt;

use agrimandi::api::{AppState, router};
use agrimandi::calendar::{CropCalendar, MonthPhase, ReferenceData};
use agrimandi::config::AgriMandiConfig;
use agrimandi::geocoding::GeocodingClient;
use agrimandi::listings::ListingBook;
use agrimandi::market::PriceBoard;
use agrimandi::session::{MemorySessionStore, SessionContext};
use agrimandi::weather::WeatherService;

fn calendar() -> CropCalendar {
    CropCalendar::new(ReferenceData::embedded().expect("embedded data must load"))
}

fn app_state() -> Arc<AppState> {
    let config = AgriMandiConfig::default();
    let weather =
        WeatherService::new(&config.weather, None, config.cache.ttl_hours).expect("weather service");
    let http_client =
        reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build();
    let geocoding = GeocodingClient::new(http_client, &config.geocoding);
    let sessions = SessionContext::initialize(Box::new(MemorySessionStore::default()))
        .expect("session context");

    Arc::new(AppState {
        calendar: calendar(),
        market: RwLock::new(PriceBoard::from_reference().expect("market quotes")),
        listings: RwLock::new(ListingBook::new()),
        sessions: RwLock::new(sessions),
        weather,
        geocoding,
    })
}

#[test]
fn recommendations_are_sound_for_every_region_and_month() {
    let cal = calendar();
    let data = cal.reference();

    for region in data.regions() {
        for month in 1..=12u8 {
            let crops = cal.recommend(&region.id, month).unwrap();
            for crop in crops {
                assert!(
                    crop.grown_in(&region.id),
                    "{} recommended outside its regions in {}",
                    crop.id,
                    region.id
                );
                assert!(
                    crop.sowing_window.contains(month),
                    "{} recommended outside its sowing window in month {}",
                    crop.id,
                    month
                );
            }
        }
    }
}

#[test]
fn every_crop_is_recommended_somewhere() {
    let cal = calendar();
    let data = cal.reference();

    for crop in data.crops() {
        let mut seen = false;
        'outer: for region in data.regions() {
            for month in 1..=12u8 {
                if cal
                    .recommend(&region.id, month)
                    .unwrap()
                    .iter()
                    .any(|c| c.id == crop.id)
                {
                    seen = true;
                    break 'outer;
                }
            }
        }
        assert!(seen, "{} is never recommended anywhere", crop.id);
    }
}

#[test]
fn timeline_phases_are_consistent_with_windows() {
    let cal = calendar();
    for entry in cal.timeline() {
        let crop = cal
            .reference()
            .crops()
            .iter()
            .find(|c| c.id == entry.crop_id)
            .unwrap();
        for (idx, phase) in entry.months.iter().enumerate() {
            let month = u8::try_from(idx + 1).unwrap();
            if crop.sowing_window.contains(month) {
                assert_eq!(*phase, MonthPhase::Sowing);
            } else if crop.harvest_window.contains(month) {
                assert_eq!(*phase, MonthPhase::Harvest);
            }
        }
    }
}

#[tokio::test]
async fn recommendations_endpoint_returns_crops() {
    let app = router(app_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/recommendations?region=Punjab&month=12")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let crops: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert!(crops.iter().any(|c| c["id"] == "wheat"));
}

#[tokio::test]
async fn recommendations_endpoint_rejects_bad_month() {
    let app = router(app_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/recommendations?region=Punjab&month=13")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(parsed["error"].as_str().unwrap().contains("1 and 12"));
}

#[tokio::test]
async fn unknown_region_returns_empty_list() {
    let app = router(app_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/recommendations?region=Atlantis&month=6")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let crops: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert!(crops.is_empty());
}

#[tokio::test]
async fn prices_endpoint_supports_search() {
    let app = router(app_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/prices?query=cotton")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let quotes: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0]["trend"], "up");
}

#[tokio::test]
async fn listing_lifecycle_over_http() {
    let state = app_state();

    let draft = serde_json::json!({
        "farmer": {
            "name": "Harpreet Singh",
            "phone": "+91 98765 43210",
            "email": "harpreet@example.com"
        },
        "district": "Ludhiana",
        "state": "Punjab",
        "crop_name": "Wheat",
        "variety": "HD-2967",
        "quantity_quintals": 50.0,
        "asking_price": 2150.0,
        "description": "Freshly harvested"
    });

    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/listings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(draft.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let listing: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let id = listing["id"].as_str().unwrap().to_string();
    assert_eq!(listing["status"], "pending");

    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/listings/{id}/accept"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A decided listing cannot be decided again
    let response = router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/listings/{id}/reject"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn auth_flow_over_http() {
    let state = app_state();

    // Unauthenticated
    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Weak password is rejected
    let weak = serde_json::json!({
        "email": "farmer@example.com",
        "password": "short",
        "role": "farmer"
    });
    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(weak.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Valid login
    let valid = serde_json::json!({
        "email": "farmer@example.com",
        "password": "Secret123",
        "role": "farmer"
    });
    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(valid.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let account: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(account["location"], "Punjab, India");

    let response = router(state)
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn timeline_endpoint_returns_all_crops() {
    let app = router(app_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/timeline")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let timeline: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(timeline.len(), 8);
    assert_eq!(timeline[0]["months"].as_array().unwrap().len(), 12);
}
