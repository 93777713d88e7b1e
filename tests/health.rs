mod common;

use axum::{extract::State, http::StatusCode};
use flower_shop_api::routes::health::{health_check, readiness};

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");
    assert!(response.0.success);
}

#[tokio::test]
async fn readiness_pings_the_database() -> anyhow::Result<()> {
    let state = common::setup().await?;
    let (status, body) = readiness(State(state)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.0.success);
    Ok(())
}
