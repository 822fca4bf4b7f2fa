//! Failure injection tests: every dependency failure mode degrades to a
//! fallback value, never to a failed request.

use std::time::{Duration, Instant};

use ad_service::observability::memory::MetricEvent;
use ad_service::observability::{CallOutcome, RequestStatus};
use ad_service::downstream::Service;
use serde_json::Value;

mod common;
use common::{
    ad_request, analytics_body, bid_body, spawn_app, spawn_app_with_timeout, start_mock_service,
    Behavior,
};

async fn post_ad(base_url: &str, user_id: &str, ad_type: &str) -> Value {
    let res = reqwest::Client::new()
        .post(format!("{base_url}/ads/request"))
        .json(&ad_request(user_id, ad_type))
        .send()
        .await
        .expect("ad service unreachable");
    assert_eq!(res.status(), 200, "dependency failures must not fail the request");
    res.json().await.unwrap()
}

#[tokio::test]
async fn test_analytics_server_error_uses_fallback() {
    let analytics = start_mock_service(Behavior::Status(503)).await;
    let bidding = start_mock_service(Behavior::Json(bid_body(1.10))).await;
    let app = spawn_app(&analytics.url, &bidding.url).await;

    let body = post_ad(&app.base_url, "u1", "banner").await;
    assert_eq!(body["user_data"], "User analytics: 2.00% click rate");
    assert_eq!(body["bid_amount"], 1.10);

    // No retries.
    assert_eq!(analytics.hits(), 1);
    assert_eq!(
        app.metrics.downstream_outcomes(Service::Analytics),
        [CallOutcome::Failure("status")]
    );
    assert_eq!(
        app.metrics.downstream_outcomes(Service::Bidding),
        [CallOutcome::Success]
    );
}

#[tokio::test]
async fn test_client_error_status_is_also_a_failure() {
    let analytics = start_mock_service(Behavior::Json(analytics_body("u1", 0.3))).await;
    let bidding = start_mock_service(Behavior::Status(404)).await;
    let app = spawn_app(&analytics.url, &bidding.url).await;

    let body = post_ad(&app.base_url, "u1", "video").await;
    assert_eq!(body["bid_amount"], 0.50);
    assert_eq!(body["user_data"], "User analytics: 30.00% click rate");
    assert_eq!(bidding.hits(), 1);
}

#[tokio::test]
async fn test_undecodable_bid_uses_fallback() {
    let analytics = start_mock_service(Behavior::Json(analytics_body("u1", 0.1))).await;
    let bidding = start_mock_service(Behavior::Garbage).await;
    let app = spawn_app(&analytics.url, &bidding.url).await;

    let body = post_ad(&app.base_url, "u1", "native").await;
    assert_eq!(body["bid_amount"], 0.50);
    assert_eq!(
        app.metrics.downstream_outcomes(Service::Bidding),
        [CallOutcome::Failure("decode")]
    );
    let log = app.logs.find("Error getting bid").unwrap();
    assert_eq!(log.get("error.kind"), Some("decode"));
}

#[tokio::test]
async fn test_slow_dependency_times_out_to_fallback() {
    let analytics = start_mock_service(Behavior::Slow(
        Duration::from_secs(5),
        analytics_body("u1", 0.5),
    ))
    .await;
    let bidding = start_mock_service(Behavior::Json(bid_body(3.0))).await;
    let app =
        spawn_app_with_timeout(&analytics.url, &bidding.url, Duration::from_millis(300)).await;

    let start = Instant::now();
    let body = post_ad(&app.base_url, "u1", "banner").await;
    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(body["user_data"], "User analytics: 2.00% click rate");
    assert_eq!(body["bid_amount"], 3.0);
    assert_eq!(
        app.metrics.downstream_outcomes(Service::Analytics),
        [CallOutcome::Failure("transport")]
    );
}

#[tokio::test]
async fn test_duration_includes_fallback_path() {
    let analytics = start_mock_service(Behavior::Status(500)).await;
    let bidding = start_mock_service(Behavior::Status(500)).await;
    let app = spawn_app(&analytics.url, &bidding.url).await;

    post_ad(&app.base_url, "u1", "banner").await;

    assert_eq!(app.metrics.request_count(RequestStatus::Success, "banner"), 1);
    assert_eq!(app.metrics.request_count(RequestStatus::Error, "banner"), 0);
    let durations: Vec<f64> = app
        .metrics
        .events()
        .into_iter()
        .filter_map(|e| match e {
            MetricEvent::RequestDuration { ad_type, seconds } if ad_type == "banner" => {
                Some(seconds)
            }
            _ => None,
        })
        .collect();
    assert_eq!(durations.len(), 1);
    assert!(durations[0] > 0.0);
}

#[tokio::test]
async fn test_concurrent_requests_have_independent_fallbacks() {
    let analytics = start_mock_service(Behavior::FailWhenPathContains(
        "/user/bad_",
        analytics_body("good", 0.05),
    ))
    .await;
    let bidding = start_mock_service(Behavior::Json(bid_body(1.5))).await;
    let app = spawn_app(&analytics.url, &bidding.url).await;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let base_url = app.base_url.clone();
        let user_id = if i % 2 == 0 {
            format!("bad_{i}")
        } else {
            format!("good_{i}")
        };
        tasks.push(tokio::spawn(async move {
            let body = post_ad(&base_url, &user_id, "banner").await;
            (user_id, body)
        }));
    }

    for task in tasks {
        let (user_id, body) = task.await.unwrap();
        let expected = if user_id.starts_with("bad_") {
            "User analytics: 2.00% click rate"
        } else {
            "User analytics: 5.00% click rate"
        };
        assert_eq!(body["user_data"], expected, "user {user_id}");
        assert_eq!(body["bid_amount"], 1.5, "user {user_id}");
    }

    assert_eq!(bidding.hits(), 20);
    assert_eq!(app.metrics.request_count(RequestStatus::Success, "banner"), 20);
}
