//! HTTP request handlers

use axum::{
    extract::State,
    response::Html,
    Form, Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::data::{PropertyFeatures, AMENITIES, BATHROOMS, BEDROOMS, LOCATION, SIZE_SQFT};
use crate::store::PredictionRecord;

use super::error::{Result, ServerError};
use super::state::AppState;

// ============================================================================
// Prediction Handlers
// ============================================================================

/// Predict one price, persist it, and return the stored document
async fn predict_and_store(state: &AppState, features: PropertyFeatures) -> Result<PredictionRecord> {
    let price = state.pipeline.predict_one(&features)?;
    let record = PredictionRecord::new(&features, price);
    state.store.save(&record).await?;

    info!(
        id = %record.id,
        location = %record.location,
        size_sqft = record.size_sqft,
        predicted_price = price,
        "Prediction served"
    );
    Ok(record)
}

/// Extract and validate the urlencoded form fields
fn parse_form(fields: &HashMap<String, String>) -> Result<PropertyFeatures> {
    let field = |name: &str| fields.get(name).map(|v| v.trim()).unwrap_or("");

    let (location, size_sqft, bedrooms, bathrooms) =
        (field(LOCATION), field(SIZE_SQFT), field(BEDROOMS), field(BATHROOMS));
    if location.is_empty() || size_sqft.is_empty() || bedrooms.is_empty() || bathrooms.is_empty() {
        return Err(ServerError::InvalidForm("Missing required form fields".to_string()));
    }

    let invalid = |name: &str, value: &str, e: &dyn std::fmt::Display| {
        ServerError::InvalidForm(format!("Invalid input: {} '{}': {}", name, value, e))
    };
    let size: f64 = size_sqft.parse().map_err(|e| invalid(SIZE_SQFT, size_sqft, &e))?;
    if !size.is_finite() {
        return Err(invalid(SIZE_SQFT, size_sqft, &"not a finite number"));
    }
    let beds: u32 = bedrooms.parse().map_err(|e| invalid(BEDROOMS, bedrooms, &e))?;
    let baths: u32 = bathrooms.parse().map_err(|e| invalid(BATHROOMS, bathrooms, &e))?;

    Ok(PropertyFeatures::new(location, size, beds, baths, field(AMENITIES)))
}

/// Form submission from the index page
pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Html<String>> {
    let features = parse_form(&fields)?;
    let record = predict_and_store(&state, features).await?;
    Ok(Html(render_result(&record)))
}

/// Single JSON prediction
pub async fn predict_json(
    State(state): State<Arc<AppState>>,
    Json(features): Json<PropertyFeatures>,
) -> Result<Json<PredictionRecord>> {
    let record = predict_and_store(&state, features).await?;
    Ok(Json(record))
}

/// Batch JSON prediction, one stored document per row
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(rows): Json<Vec<PropertyFeatures>>,
) -> Result<Json<serde_json::Value>> {
    if rows.is_empty() {
        return Err(ServerError::BadRequest("batch contains no rows".to_string()));
    }

    let prices = state.pipeline.predict(&rows)?;
    let mut ids = Vec::with_capacity(rows.len());
    for (features, price) in rows.iter().zip(prices.iter()) {
        let record = PredictionRecord::new(features, *price);
        ids.push(state.store.save(&record).await?);
    }

    info!(rows = rows.len(), "Batch prediction served");
    Ok(Json(serde_json::json!({
        "ids": ids,
        "predictions": prices.to_vec(),
        "count": rows.len(),
    })))
}

// ============================================================================
// System Handlers
// ============================================================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    let stored = state.store.count().await?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "model_path": state.config.model_path.display().to_string(),
        "store": {
            "kind": state.store.name(),
            "path": state.config.predictions_path.display().to_string(),
            "predictions": stored,
        },
        "model": state.metadata,
    })))
}

// ============================================================================
// UI Handlers
// ============================================================================

pub async fn serve_index() -> Html<String> {
    Html(EMBEDDED_INDEX_HTML.to_string())
}

fn render_result(record: &PredictionRecord) -> String {
    let amenities = if record.amenities.is_empty() {
        "none listed".to_string()
    } else {
        html_escape::encode_text(&record.amenities).into_owned()
    };

    EMBEDDED_RESULT_HTML
        .replace("{{price}}", &format!("{:.2}", record.predicted_price))
        .replace("{{location}}", &html_escape::encode_text(&record.location))
        .replace("{{size_sqft}}", &record.size_sqft.to_string())
        .replace("{{bedrooms}}", &record.bedrooms.to_string())
        .replace("{{bathrooms}}", &record.bathrooms.to_string())
        .replace("{{amenities}}", &amenities)
}

const EMBEDDED_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Property Price Estimator</title>
    <style>
        body{font-family:system-ui,sans-serif;max-width:32rem;margin:3rem auto;padding:0 1rem}
        label{display:block;margin-top:1rem}
        input{width:100%;padding:.4rem;box-sizing:border-box}
        button{margin-top:1.5rem;padding:.5rem 1.5rem}
    </style>
</head>
<body>
    <h1>Property Price Estimator</h1>
    <form action="/predict" method="post">
        <label>Location <input name="location" required></label>
        <label>Size (sqft) <input name="size_sqft" type="number" step="any" min="0" required></label>
        <label>Bedrooms <input name="bedrooms" type="number" min="0" required></label>
        <label>Bathrooms <input name="bathrooms" type="number" min="0" required></label>
        <label>Amenities <input name="amenities"></label>
        <button type="submit">Estimate</button>
    </form>
</body>
</html>
"#;

const EMBEDDED_RESULT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Estimated Price</title>
    <style>body{font-family:system-ui,sans-serif;max-width:32rem;margin:3rem auto;padding:0 1rem}</style>
</head>
<body>
    <h1>Estimated price: {{price}}</h1>
    <ul>
        <li>Location: {{location}}</li>
        <li>Size: {{size_sqft}} sqft</li>
        <li>Bedrooms: {{bedrooms}}</li>
        <li>Bathrooms: {{bathrooms}}</li>
        <li>Amenities: {{amenities}}</li>
    </ul>
    <a href="/">New estimate</a>
</body>
</html>
"#;
