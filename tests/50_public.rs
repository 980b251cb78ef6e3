mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use apiary_api::database::ApiaryStore;
use common::TestApp;

#[tokio::test]
async fn contacts_are_redacted_until_published() -> Result<()> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;
    let bob = app.beekeeper("Bob", "Stone").await?;
    let anns_yard = app.create_beeyard(&ann, "North").await?;
    let bobs_yard = app.create_beeyard(&bob, "South").await?;
    app.create_hive(&ann, "A", anns_yard).await?;
    app.store.publish_contact(ann.id).await?;

    let res = app.get(&format!("/public/beeyards/{}", anns_yard), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.data()["beekeeper_detail"],
        json!({ "first_name": "Ann", "last_name": "Lee", "email": "annlee@example.com" })
    );
    assert_eq!(res.data()["hives_detailed"][0]["name"], "A");
    assert_eq!(res.data()["hives_detailed"][0]["beekeeper_detail"]["first_name"], "Ann");

    let res = app.get(&format!("/public/beeyards/{}", bobs_yard), None).await?;
    assert_eq!(
        res.data()["beekeeper_detail"],
        json!({ "first_name": "Not Authorized", "last_name": "Not Authorized", "email": "Not Authorized" })
    );

    let res = app.get("/public/beekeepers", None).await?;
    assert_eq!(res.data()["count"], 1);
    assert_eq!(res.data()["results"][0]["public_beekeeper_info"], ann.id);
    assert_eq!(res.data()["results"][0]["public_beekeeper_info_details"]["last_name"], "Lee");

    app.store.revoke_contact(ann.id).await?;
    let res = app.get(&format!("/public/beeyards/{}", anns_yard), None).await?;
    assert_eq!(res.data()["beekeeper_detail"]["email"], "Not Authorized");
    Ok(())
}

#[tokio::test]
async fn public_listing_is_paginated() -> Result<()> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;
    for i in 0..5 {
        app.create_beeyard(&ann, &format!("Yard {}", i)).await?;
    }

    let res = app.get("/public/beeyards?size=2", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["count"], 5);
    assert_eq!(res.data()["results"].as_array().unwrap().len(), 2);
    assert_eq!(res.data()["previous"], json!(null));
    assert_eq!(res.data()["next"], "/public/beeyards?size=2&page=2");

    let res = app.get("/public/beeyards?size=2&page=3", None).await?;
    assert_eq!(res.data()["results"].as_array().unwrap().len(), 1);
    assert_eq!(res.data()["next"], json!(null));
    assert_eq!(res.data()["previous"], "/public/beeyards?size=2&page=2");

    let res = app.get("/public/beeyards?size=2&page=4", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Invalid page.");

    let res = app.get("/public/beeyards?page=abc", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn public_filters_by_keeper_name() -> Result<()> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;
    let bob = app.beekeeper("Bob", "Stone").await?;
    let anns_yard = app.create_beeyard(&ann, "North").await?;
    app.create_hive(&ann, "A", anns_yard).await?;
    let bobs_yard = app.create_beeyard(&bob, "South").await?;
    app.create_hive(&bob, "B", bobs_yard).await?;
    app.store.publish_contact(ann.id).await?;
    app.store.publish_contact(bob.id).await?;

    let res = app.get("/public/beeyards?beekeeper=lee", None).await?;
    assert_eq!(res.data()["count"], 1);
    assert_eq!(res.data()["results"][0]["id"], anns_yard);

    let res = app.get("/public/hives?beeyard__beekeeper=bob", None).await?;
    assert_eq!(res.data()["count"], 1);
    assert_eq!(res.data()["results"][0]["name"], "B");

    // keepers without a published contact are not searchable
    app.store.revoke_contact(bob.id).await?;
    let res = app.get("/public/hives?beeyard__beekeeper=bob", None).await?;
    assert_eq!(res.data()["count"], 0);
    Ok(())
}

#[tokio::test]
async fn public_surface_is_read_only() -> Result<()> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;

    let res = app.post("/public/beeyards", Some(&ann.token), json!({ "name": "x" })).await?;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);

    let res = app.get("/public/hives/42", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}
