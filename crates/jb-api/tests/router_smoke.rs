use axum::{body::Body, http::Request, http::StatusCode};
use tower::ServiceExt;

#[tokio::test]
async fn livez_is_healthy_without_a_database() {
    let state = jb_api::test_state();
    let app = jb_api::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/livez")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_search_parameters_fail_before_the_database() {
    let state = jb_api::test_state();
    let app = jb_api::create_router(state);

    for uri in [
        "/api/jobs?limit=0",
        "/api/jobs?page=10001",
        "/api/jobs?salary=-100",
        "/api/jobs?sortBy=employer_name;%20DROP%20TABLE%20jobs",
        "/api/jobs?geolocation=north,east",
        "/api/jobs?fromDate=15-06-2024",
        "/api/jobs?districts=three",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
    }
}
