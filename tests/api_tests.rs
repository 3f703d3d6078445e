use actix_web::{http::StatusCode, test};
use bandsync::config::Config;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

#[macro_use]
mod common;

fn config() -> Config {
    common::setup_test_env();
    Config::test_config()
}

macro_rules! test_unauthorized {
    ($test_name:ident, $method:ident, $uri:expr) => {
        #[actix_web::test]
        async fn $test_name() {
            let config = config();
            let app = test_app!(common::lazy_state(&config), config);

            let req = test::TestRequest::$method().uri($uri).to_request();
            let resp = test::call_service(&app, req).await;

            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    };
}

test_unauthorized!(create_event_requires_token, post, "/api/v1/events");
test_unauthorized!(upcoming_requires_token, get, "/api/v1/events/upcoming");
test_unauthorized!(
    band_events_require_token,
    get,
    "/api/v1/bands/7f0c2a52-5a43-4c5c-9a55-0c6e1b1f7a10/events"
);
test_unauthorized!(notifications_require_token, get, "/api/v1/notifications");
test_unauthorized!(
    preferences_require_token,
    put,
    "/api/v1/notifications/preferences"
);

#[actix_web::test]
async fn rejects_token_signed_with_another_secret() {
    let config = config();
    let mut other = config.clone();
    other.jwt_secret = "some-other-secret-that-is-long-enough".to_string();
    let app = test_app!(common::lazy_state(&config), config);

    let req = test::TestRequest::get()
        .uri("/api/v1/events/upcoming")
        .insert_header(("Authorization", common::bearer(Uuid::new_v4(), &other)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn rejects_overlong_title_before_touching_the_database() {
    let config = config();
    let app = test_app!(common::lazy_state(&config), config.clone());

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .insert_header(("Authorization", common::bearer(Uuid::new_v4(), &config)))
        .set_json(json!({
            "bandId": Uuid::new_v4(),
            "title": "x".repeat(201),
            "eventType": "show",
            "startTime": "2030-06-01T20:00:00Z"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["message"],
        json!("Validation error: title must be at most 200 characters")
    );
}

#[actix_web::test]
async fn malformed_json_is_a_validation_error() {
    let config = config();
    let app = test_app!(common::lazy_state(&config), config.clone());

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .insert_header(("Authorization", common::bearer(Uuid::new_v4(), &config)))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn upcoming_limit_out_of_range_is_rejected() {
    let config = config();
    let app = test_app!(common::lazy_state(&config), config.clone());

    for limit in [0, 101] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/events/upcoming?limit={}", limit))
            .insert_header(("Authorization", common::bearer(Uuid::new_v4(), &config)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "limit={}", limit);
    }
}

#[actix_web::test]
async fn cron_rejects_wrong_or_missing_secret() {
    let config = config();
    let app = test_app!(common::lazy_state(&config), config);

    let wrong = test::TestRequest::post()
        .uri("/api/v1/cron/reminders")
        .insert_header(("Authorization", "Bearer not-the-secret"))
        .to_request();
    assert_eq!(
        test::call_service(&app, wrong).await.status(),
        StatusCode::UNAUTHORIZED
    );

    // Same length as the configured secret, last byte differs
    let near_miss = test::TestRequest::post()
        .uri("/api/v1/cron/reminders")
        .insert_header(("Authorization", "Bearer test-cron-secreT"))
        .to_request();
    assert_eq!(
        test::call_service(&app, near_miss).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let missing = test::TestRequest::post()
        .uri("/api/v1/cron/reminders")
        .to_request();
    assert_eq!(
        test::call_service(&app, missing).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn cron_is_closed_when_no_secret_is_configured() {
    let mut config = config();
    config.cron_secret = None;
    let app = test_app!(common::lazy_state(&config), config);

    let req = test::TestRequest::post()
        .uri("/api/v1/cron/reminders")
        .insert_header(("Authorization", "Bearer "))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn non_uuid_event_id_is_not_found() {
    let config = config();
    let app = test_app!(common::lazy_state(&config), config.clone());

    let req = test::TestRequest::get()
        .uri("/api/v1/events/not-a-uuid")
        .insert_header(("Authorization", common::bearer(Uuid::new_v4(), &config)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
