mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{Beekeeper, TestApp};

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .map(|rows| rows.iter().filter_map(|r| r["id"].as_i64()).collect())
        .unwrap_or_default()
}

struct Apiary {
    app: TestApp,
    ann: Beekeeper,
    north: i64,
    hive_a: i64,
    hive_b: i64,
}

async fn apiary() -> Result<Apiary> {
    let app = TestApp::new();
    let ann = app.beekeeper("Ann", "Lee").await?;
    let north = app.create_beeyard(&ann, "North field").await?;
    let south = app.create_beeyard(&ann, "South field").await?;
    let hive_a = app.create_hive(&ann, "A", north).await?;
    let res = app
        .post(
            "/api/hives",
            Some(&ann.token),
            json!({ "name": "B", "status": "pending", "species": "black_bee", "beeyard_id": south, "queen_year": 2019 }),
        )
        .await?;
    let hive_b = res.id();
    Ok(Apiary { app, ann, north, hive_a, hive_b })
}

#[tokio::test]
async fn hive_filters() -> Result<()> {
    let Apiary { app, ann, north, hive_a, hive_b } = apiary().await?;
    let token = Some(ann.token.as_str());

    let res = app.get("/api/hives?status=pending", token).await?;
    assert_eq!(ids(res.data()), vec![hive_b]);

    let res = app.get("/api/hives?queen_year__gte=2020", token).await?;
    assert_eq!(ids(res.data()), vec![hive_a]);

    let res = app.get(&format!("/api/hives?beeyard__id={}", north), token).await?;
    assert_eq!(ids(res.data()), vec![hive_a]);

    let res = app.get("/api/hives?beeyard__name__icontains=SOUTH", token).await?;
    assert_eq!(ids(res.data()), vec![hive_b]);

    let res = app.get("/api/hives?colour=blue", token).await?;
    assert_eq!(ids(res.data()), vec![hive_a, hive_b]);
    Ok(())
}

#[tokio::test]
async fn beeyard_name_lookups() -> Result<()> {
    let Apiary { app, ann, north, .. } = apiary().await?;
    let token = Some(ann.token.as_str());

    let res = app.get("/api/beeyards?name__icontains=north", token).await?;
    assert_eq!(ids(res.data()), vec![north]);

    let res = app.get("/api/beeyards?name=north%20field", token).await?;
    assert_eq!(ids(res.data()), Vec::<i64>::new());
    Ok(())
}

#[tokio::test]
async fn intervention_detail_filters() -> Result<()> {
    let Apiary { app, ann, hive_a, hive_b, .. } = apiary().await?;
    let token = Some(ann.token.as_str());

    let small = app
        .create_intervention(
            &ann,
            json!({ "intervention_type": "harvest", "hive_affected": hive_a, "detail": { "quantity": 1.0 } }),
        )
        .await?
        .id();
    let large = app
        .create_intervention(
            &ann,
            json!({ "intervention_type": "harvest", "hive_affected": hive_b, "detail": { "quantity": 6.0 } }),
        )
        .await?
        .id();
    let treated = app
        .create_intervention(
            &ann,
            json!({ "intervention_type": "treatment", "hive_affected": hive_a, "detail": { "treatment_type": "oxalic_acid" } }),
        )
        .await?
        .id();
    let fed = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "syrup_distribution",
                "hive_affected": hive_b,
                "detail": { "syrup_type": "raw_sugar", "quantity": 2 }
            }),
        )
        .await?
        .id();

    let res = app.get("/api/interventions?harvest_gt=5", token).await?;
    assert_eq!(ids(res.data()), vec![large]);

    let res = app.get("/api/interventions?harvest_lt=5", token).await?;
    assert_eq!(ids(res.data()), vec![small]);

    let res = app.get("/api/interventions?treatment_type=oxalic_acid", token).await?;
    assert_eq!(ids(res.data()), vec![treated]);

    let res = app.get("/api/interventions?syrup_type=raw_sugar", token).await?;
    assert_eq!(ids(res.data()), vec![fed]);

    let res = app.get("/api/interventions?intervention_type=harvest", token).await?;
    assert_eq!(ids(res.data()), vec![small, large]);

    let res = app.get(&format!("/api/interventions?hive_affected__id={}", hive_a), token).await?;
    assert_eq!(ids(res.data()), vec![small, treated]);
    Ok(())
}

#[tokio::test]
async fn malformed_filter_values_are_rejected() -> Result<()> {
    let Apiary { app, ann, .. } = apiary().await?;
    let token = Some(ann.token.as_str());

    let res = app.get("/api/interventions?harvest_gt=lots", token).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["harvest_gt"].is_string());

    let res = app.get("/api/hives?date_updated__gt=yesterday", token).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.get("/api/hives?queen_year__icontains=20", token).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}
