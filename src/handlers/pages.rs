// handlers/pages.rs - server-rendered pages under /apiary/
//
// Plain string building; every interpolated value goes through `escape`.

use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::collections::HashMap;
use std::fmt::Write;

use crate::api::format;
use crate::app::AppState;
use crate::error::ApiError;
use crate::filter::{FilterSet, Resource};
use crate::ownership::{authorize, AccessError, Identity, Owned};

/// GET /apiary/ - the caller's bee yards and their hives
pub async fn beeyards_page(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> Response {
    match render_beeyards(&state, &identity).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => error_page(&err),
    }
}

/// GET /apiary/interventions/?hive=<id> - interventions logged on one hive
pub async fn interventions_page(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    match render_interventions(&state, &identity, &query).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => error_page(&err),
    }
}

async fn render_beeyards(state: &AppState, identity: &Identity) -> Result<String, ApiError> {
    let Identity::Beekeeper { username, .. } = identity else {
        return Err(AccessError::Unauthenticated.into());
    };
    let store = state.store.as_ref();
    let yards = store
        .list_beeyards(identity.scope(), &FilterSet::none(), None)
        .await?
        .rows;

    let mut body = format!("<h1>Bee yards of {}</h1>\n", escape(username));
    if yards.is_empty() {
        body.push_str("<p>You have no bee yards yet.</p>\n");
    }
    for yard in yards {
        let hives = store.hives_in_yard(yard.id).await?;
        let _ = writeln!(body, "<section>\n<h2>{}</h2>", escape(&yard.name));
        if hives.is_empty() {
            body.push_str("<p>No hives.</p>\n");
        } else {
            body.push_str(
                "<table>\n<tr><th>Hive</th><th>Status</th><th>Species</th><th>Queen year</th><th>Updated</th></tr>\n",
            );
            for hive in hives {
                let _ = writeln!(
                    body,
                    "<tr><td><a href=\"/apiary/interventions/?hive={}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    hive.id,
                    escape(&hive.name),
                    hive.status,
                    hive.species,
                    hive.queen_year,
                    hive.date_updated,
                );
            }
            body.push_str("</table>\n");
        }
        body.push_str("</section>\n");
    }

    Ok(layout("My apiary", &body))
}

async fn render_interventions(
    state: &AppState,
    identity: &Identity,
    query: &HashMap<String, String>,
) -> Result<String, ApiError> {
    identity.require()?;
    let hive_id = query
        .get("hive")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::not_found("Hive not found"))?;

    let store = state.store.as_ref();
    authorize(store, identity, Owned::Hive(hive_id)).await?;
    let hive = store
        .hive(hive_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Hive not found"))?;

    let mut params = HashMap::new();
    params.insert("hive_affected__id".to_string(), hive_id.to_string());
    let filters = FilterSet::from_query(Resource::Intervention, &params)?;
    let rows = store.list_interventions(identity.scope(), &filters, None).await?.rows;
    let views = format::interventions(store, rows).await?;

    let mut body = format!("<h1>Interventions on {}</h1>\n", escape(&hive.name));
    if views.is_empty() {
        body.push_str("<p>No interventions recorded.</p>\n");
    } else {
        body.push_str("<table>\n<tr><th>Date</th><th>Intervention</th><th>Detail</th></tr>\n");
        for view in views {
            let detail = view.content_object.as_ref().map(describe_detail).unwrap_or_default();
            let _ = writeln!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                view.date.format("%Y-%m-%d %H:%M"),
                view.intervention_type,
                escape(&detail),
            );
        }
        body.push_str("</table>\n");
    }
    body.push_str("<p><a href=\"/apiary/\">Back to my apiary</a></p>\n");

    Ok(layout("Interventions", &body))
}

/// One-line summary of a rendered detail payload.
fn describe_detail(detail: &serde_json::Value) -> String {
    let text = |key: &str| detail.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let quantity = detail.get("quantity").and_then(|v| v.as_f64());

    if let Some(syrup) = text("syrup_type") {
        format!("{} liters of {}", quantity.unwrap_or_default(), syrup)
    } else if let Some(treatment) = text("treatment_type") {
        treatment
    } else if let Some(name) = text("name") {
        format!("child hive {}", name)
    } else if let Some(kilos) = quantity {
        format!("{} kilos", kilos)
    } else {
        String::new()
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

fn error_page(err: &ApiError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let heading = status.canonical_reason().unwrap_or("Error");
    let body = format!("<h1>{} {}</h1>\n<p>{}</p>\n", status.as_u16(), heading, escape(err.message()));
    (status, Html(layout(heading, &body))).into_response()
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"Tom\" & 'Jerry'</b>"), "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;");
    }

    #[test]
    fn describes_each_detail() {
        assert_eq!(describe_detail(&json!({"quantity": 2.5})), "2.5 kilos");
        assert_eq!(describe_detail(&json!({"quantity": 1.0, "syrup_type": "nectar"})), "1 liters of nectar");
        assert_eq!(describe_detail(&json!({"treatment_type": "apivar"})), "apivar");
        assert_eq!(describe_detail(&json!({"id": 3, "name": "H2", "status": "active"})), "child hive H2");
    }
}
