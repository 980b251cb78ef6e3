mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{Beekeeper, TestApp};

async fn keeper_with_hives(app: &TestApp) -> Result<(Beekeeper, i64, i64)> {
    let ann = app.beekeeper("Ann", "Lee").await?;
    let yard = app.create_beeyard(&ann, "North").await?;
    let first = app.create_hive(&ann, "A", yard).await?;
    let second = app.create_hive(&ann, "B", yard).await?;
    Ok((ann, first, second))
}

#[tokio::test]
async fn harvest_with_nested_detail() -> Result<()> {
    let app = TestApp::new();
    let (ann, hive, _) = keeper_with_hives(&app).await?;

    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "harvest",
                "hive_affected": hive,
                "detail": { "kind": "harvest", "quantity": 2.5 }
            }),
        )
        .await?;

    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    assert_eq!(res.data()["intervention_type"], "harvest");
    assert_eq!(res.data()["hive_affected"], hive);
    assert_eq!(res.data()["content_type"], "harvest");
    assert!(res.data()["object_id"].as_i64().unwrap() > 0);
    assert_eq!(res.data()["content_object"], json!({ "quantity": 2.5 }));
    assert!(res.data()["date"].is_string());
    Ok(())
}

#[tokio::test]
async fn syrup_needs_type_and_quantity() -> Result<()> {
    let app = TestApp::new();
    let (ann, hive, _) = keeper_with_hives(&app).await?;

    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "syrup_distribution",
                "hive_affected": hive,
                "detail": { "quantity": -1 }
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["detail.syrup_type"].is_string());
    assert!(res.body["field_errors"]["detail.quantity"].is_string());

    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "syrup_distribution",
                "hive_affected": hive,
                "detail": { "syrup_type": "cane_sugar", "quantity": 1.5 }
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(
        res.data()["content_object"],
        json!({ "quantity": 1.5, "syrup_type": "cane_sugar" })
    );
    Ok(())
}

#[tokio::test]
async fn treatments_share_one_row_per_type() -> Result<()> {
    let app = TestApp::new();
    let (ann, first, second) = keeper_with_hives(&app).await?;

    let mut object_ids = Vec::new();
    for hive in [first, second] {
        let res = app
            .create_intervention(
                &ann,
                json!({
                    "intervention_type": "treatment",
                    "hive_affected": hive,
                    "detail": { "treatment_type": "apivar" }
                }),
            )
            .await?;
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.data()["content_object"], json!({ "treatment_type": "apivar" }));
        object_ids.push(res.data()["object_id"].clone());
    }
    assert_eq!(object_ids[0], object_ids[1]);

    // the shared row can also be referenced explicitly
    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "treatment",
                "hive_affected": first,
                "content_type": "treatment",
                "object_id": object_ids[0]
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn detail_must_match_the_intervention_type() -> Result<()> {
    let app = TestApp::new();
    let (ann, hive, _) = keeper_with_hives(&app).await?;

    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "health_check",
                "hive_affected": hive,
                "detail": { "quantity": 3 }
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "INVALID_REFERENCE");

    let res = app
        .create_intervention(&ann, json!({ "intervention_type": "harvest", "hive_affected": hive }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["content_type"].is_string());

    let harvest = app
        .create_intervention(
            &ann,
            json!({ "intervention_type": "harvest", "hive_affected": hive, "detail": { "quantity": 1 } }),
        )
        .await?;
    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "treatment",
                "hive_affected": hive,
                "content_type": "harvest",
                "object_id": harvest.data()["object_id"]
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["content_type"].as_str().unwrap().contains("Expected a treatment"));
    Ok(())
}

#[tokio::test]
async fn a_payload_belongs_to_one_intervention() -> Result<()> {
    let app = TestApp::new();
    let (ann, hive, _) = keeper_with_hives(&app).await?;

    let harvest = app
        .create_intervention(
            &ann,
            json!({ "intervention_type": "harvest", "hive_affected": hive, "detail": { "quantity": 4 } }),
        )
        .await?;
    let object_id = harvest.data()["object_id"].clone();

    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "harvest",
                "hive_affected": hive,
                "content_type": "harvest",
                "object_id": object_id
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["object_id"].as_str().unwrap().contains("already recorded"));

    // the owner may keep pointing at its own row
    let res = app
        .put(
            &format!("/api/interventions/{}", harvest.id()),
            Some(&ann.token),
            json!({
                "intervention_type": "harvest",
                "hive_affected": hive,
                "content_type": "harvest",
                "object_id": object_id
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text);
    assert_eq!(res.data()["date"], harvest.data()["date"]);
    Ok(())
}

#[tokio::test]
async fn artificial_swarming_points_at_another_own_hive() -> Result<()> {
    let app = TestApp::new();
    let (ann, parent, child) = keeper_with_hives(&app).await?;

    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "artificial_swarming",
                "hive_affected": parent,
                "content_type": "hive",
                "object_id": child
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    assert_eq!(res.data()["content_type"], "hive");
    assert_eq!(res.data()["content_object"]["id"], child);
    assert_eq!(res.data()["content_object"]["name"], "B");

    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "artificial_swarming",
                "hive_affected": parent,
                "content_type": "hive",
                "object_id": parent
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let bob = app.beekeeper("Bob", "Stone").await?;
    let bobs_yard = app.create_beeyard(&bob, "South").await?;
    let bobs_hive = app.create_hive(&bob, "Z", bobs_yard).await?;
    let res = app
        .create_intervention(
            &ann,
            json!({
                "intervention_type": "artificial_swarming",
                "hive_affected": parent,
                "content_type": "hive",
                "object_id": bobs_hive
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "INVALID_REFERENCE");
    Ok(())
}

#[tokio::test]
async fn interventions_only_on_own_hives() -> Result<()> {
    let app = TestApp::new();
    let (ann, hive, _) = keeper_with_hives(&app).await?;
    let bob = app.beekeeper("Bob", "Stone").await?;

    let res = app
        .create_intervention(&bob, json!({ "intervention_type": "health_check", "hive_affected": hive }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["hive_affected"].is_string());

    let res = app
        .create_intervention(&ann, json!({ "intervention_type": "health_check", "hive_affected": hive }))
        .await?;
    let id = res.id();

    let res = app.get(&format!("/api/interventions/{}", id), Some(&bob.token)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.delete(&format!("/api/interventions/{}", id), Some(&ann.token)).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = app.get(&format!("/api/interventions/{}", id), Some(&ann.token)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn contamination_crud() -> Result<()> {
    let app = TestApp::new();
    let (ann, hive, other) = keeper_with_hives(&app).await?;
    let bob = app.beekeeper("Bob", "Stone").await?;

    let res = app
        .post("/api/contaminations", Some(&ann.token), json!({ "type": "parasite", "hive": hive }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    assert_eq!(res.data()["type"], "parasite");
    assert_eq!(res.data()["hive"], hive);
    let id = res.id();

    let res = app
        .patch(&format!("/api/contaminations/{}", id), Some(&ann.token), json!({ "hive": other }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["type"], "parasite");
    assert_eq!(res.data()["hive"], other);

    let res = app
        .post("/api/contaminations", Some(&bob.token), json!({ "type": "illness", "hive": hive }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["hive"].is_string());

    let res = app
        .post("/api/contaminations", Some(&ann.token), json!({ "type": "mites", "hive": hive }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.get(&format!("/api/contaminations/{}", id), Some(&bob.token)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.delete(&format!("/api/contaminations/{}", id), Some(&ann.token)).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    Ok(())
}
