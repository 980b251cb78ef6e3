#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use apiary_api::auth::{generate_jwt, Claims};
use apiary_api::config::AppConfig;
use apiary_api::database::models::NewUser;
use apiary_api::database::{ApiaryStore, MemoryStore};
use apiary_api::{app, AppState};

/// The whole router over a fresh in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub config: AppConfig,
    router: Router,
}

pub struct Beekeeper {
    pub id: i64,
    pub username: String,
    pub token: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn id(&self) -> i64 {
        self.body["data"]["id"].as_i64().unwrap_or_default()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = AppConfig::development();
        let router = app(AppState::new(store.clone(), config.clone()));
        TestApp { store, config, router }
    }

    /// A beekeeper inserted straight into the store, with a signed token.
    pub async fn beekeeper(&self, first_name: &str, last_name: &str) -> Result<Beekeeper> {
        let username = format!("{}{}", first_name, last_name).to_lowercase();
        let user = self
            .store
            .insert_user(NewUser {
                username: username.clone(),
                password_hash: "unused".to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: format!("{}@example.com", username),
            })
            .await?;
        let token = generate_jwt(&Claims::new(&user, &self.config), &self.config)?;
        Ok(Beekeeper {
            id: user.id,
            username,
            token,
        })
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await.context("router failed")?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok(TestResponse { status, headers, text, body })
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// A page request carrying the session cookie.
    pub async fn page(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("apiary_session={}", token));
        }
        self.send(builder.body(Body::empty())?).await
    }

    pub async fn create_beeyard(&self, keeper: &Beekeeper, name: &str) -> Result<i64> {
        let res = self.post("/api/beeyards", Some(&keeper.token), json!({ "name": name })).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "beeyard create: {} {}", res.status, res.text);
        Ok(res.id())
    }

    pub async fn create_hive(&self, keeper: &Beekeeper, name: &str, beeyard_id: i64) -> Result<i64> {
        let res = self
            .post(
                "/api/hives",
                Some(&keeper.token),
                json!({
                    "name": name,
                    "status": "active",
                    "species": "italian_bee",
                    "beeyard_id": beeyard_id,
                    "queen_year": 2023
                }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "hive create: {} {}", res.status, res.text);
        Ok(res.id())
    }

    pub async fn create_intervention(&self, keeper: &Beekeeper, body: Value) -> Result<TestResponse> {
        self.post("/api/interventions", Some(&keeper.token), body).await
    }
}
