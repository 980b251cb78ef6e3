mod common;

use anyhow::Result;
use axum::http::{header, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/health", None).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["status"], "ok");
    assert_eq!(res.data()["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_the_surfaces() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/", None).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["name"], "Apiary API");
    assert!(res.data()["endpoints"]["beeyards"].as_str().unwrap().contains("/api/beeyards"));
    Ok(())
}

#[tokio::test]
async fn register_login_and_whoami() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .post(
            "/auth/register",
            None,
            json!({
                "username": "ann",
                "password": "s3cret-pw",
                "first_name": "Ann",
                "last_name": "Lee",
                "email": "ann@example.com"
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    assert_eq!(res.data()["username"], "ann");
    assert!(res.data().get("password_hash").is_none());

    let res = app
        .post("/auth/login", None, json!({ "username": "ann", "password": "s3cret-pw" }))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text);
    let token = res.data()["token"].as_str().unwrap().to_string();
    assert_eq!(res.data()["user"]["first_name"], "Ann");
    assert_eq!(res.data()["expires_in"], app.config.jwt_expiry_secs());

    let cookie = res.headers.get(header::SET_COOKIE).unwrap().to_str()?;
    assert!(cookie.starts_with(&format!("apiary_session={};", token)));
    assert!(cookie.contains("HttpOnly"));

    let res = app.get("/api/auth/whoami", Some(&token)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["username"], "ann");
    assert_eq!(res.data()["email"], "ann@example.com");
    Ok(())
}

#[tokio::test]
async fn session_cookie_authenticates_the_api() -> Result<()> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;

    let res = app.page("/api/auth/whoami", Some(&ann.token)).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["id"], ann.id);
    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() -> Result<()> {
    let app = TestApp::new();
    let body = json!({ "username": "ann", "password": "s3cret-pw" });

    let first = app.post("/auth/register", None, body.clone()).await?;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app.post("/auth/register", None, body).await?;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn registration_validates_fields() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .post("/auth/register", None, json!({ "username": "  ", "password": "short" }))
        .await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["field_errors"]["username"].is_string());
    assert!(res.body["field_errors"]["password"].as_str().unwrap().contains("at least 8"));
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() -> Result<()> {
    let app = TestApp::new();
    app.post("/auth/register", None, json!({ "username": "ann", "password": "s3cret-pw" }))
        .await?;

    let wrong = app
        .post("/auth/login", None, json!({ "username": "ann", "password": "not-it-at-all" }))
        .await?;
    let unknown = app
        .post("/auth/login", None, json!({ "username": "bob", "password": "s3cret-pw" }))
        .await?;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["message"], unknown.body["message"]);
    Ok(())
}

#[tokio::test]
async fn private_api_requires_a_token() -> Result<()> {
    let app = TestApp::new();

    for uri in ["/api/auth/whoami", "/api/beeyards", "/api/hives", "/api/interventions", "/api/contaminations"] {
        let res = app.get(uri, None).await?;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(res.body["code"], "UNAUTHORIZED");
    }

    let res = app.get("/api/beeyards", Some("not-a-jwt")).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/beeyards")
        .header(header::AUTHORIZATION, format!("Bearer {}", ann.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"name\":"))?;
    let res = app.send(request).await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn logout_expires_the_cookie() -> Result<()> {
    let app = TestApp::new();

    let res = app.post("/auth/logout", None, json!({})).await?;

    assert_eq!(res.status, StatusCode::OK);
    let cookie = res.headers.get(header::SET_COOKIE).unwrap().to_str()?;
    assert!(cookie.starts_with("apiary_session=;"));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}
