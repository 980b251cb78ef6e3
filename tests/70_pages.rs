mod common;

use anyhow::Result;
use axum::http::{header, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn apiary_page_lists_own_yards_and_hives() -> Result<()> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;
    let bob = app.beekeeper("Bob", "Stone").await?;
    let yard = app.create_beeyard(&ann, "North <field>").await?;
    let hive = app.create_hive(&ann, "A", yard).await?;
    app.create_beeyard(&bob, "Bob's yard").await?;

    let res = app.page("/apiary/", Some(&ann.token)).await?;

    assert_eq!(res.status, StatusCode::OK);
    let content_type = res.headers.get(header::CONTENT_TYPE).unwrap().to_str()?;
    assert!(content_type.starts_with("text/html"));
    assert!(res.text.contains("Bee yards of annlee"));
    assert!(res.text.contains("North &lt;field&gt;"));
    assert!(res.text.contains(&format!("/apiary/interventions/?hive={}", hive)));
    assert!(!res.text.contains("Bob"));
    Ok(())
}

#[tokio::test]
async fn apiary_page_needs_a_session() -> Result<()> {
    let app = TestApp::new();

    let res = app.page("/apiary", None).await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.text.contains("<html>"));
    Ok(())
}

#[tokio::test]
async fn interventions_page_for_one_hive() -> Result<()> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;
    let yard = app.create_beeyard(&ann, "North").await?;
    let hive = app.create_hive(&ann, "Queenie", yard).await?;
    app.create_intervention(
        &ann,
        json!({ "intervention_type": "harvest", "hive_affected": hive, "detail": { "quantity": 3.5 } }),
    )
    .await?;

    let res = app
        .page(&format!("/apiary/interventions/?hive={}", hive), Some(&ann.token))
        .await?;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.text.contains("Interventions on Queenie"));
    assert!(res.text.contains("harvest"));
    assert!(res.text.contains("3.5 kilos"));
    Ok(())
}

#[tokio::test]
async fn interventions_page_errors() -> Result<()> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;
    let bob = app.beekeeper("Bob", "Stone").await?;
    let yard = app.create_beeyard(&ann, "North").await?;
    let hive = app.create_hive(&ann, "A", yard).await?;

    let res = app.page("/apiary/interventions/", Some(&ann.token)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.page("/apiary/interventions/?hive=abc", Some(&ann.token)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .page(&format!("/apiary/interventions/?hive={}", hive), Some(&bob.token))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.page("/apiary/interventions/?hive=9999", Some(&ann.token)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}
