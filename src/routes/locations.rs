use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::models::{City, Country, University};
use crate::repo::locations;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/locations/countries", get(list_countries))
        .route("/locations/cities/{country_id}", get(list_cities))
        .route("/locations/universities/{city_id}", get(list_universities))
}

async fn list_countries(State(state): State<AppState>) -> AppResult<Json<Vec<Country>>> {
    let countries = locations::list_countries(state.db.pool()).await?;
    Ok(Json(countries))
}

async fn list_cities(
    State(state): State<AppState>,
    Path(country_id): Path<i64>,
) -> AppResult<Json<Vec<City>>> {
    let cities = locations::list_cities_by_country(state.db.pool(), country_id).await?;
    Ok(Json(cities))
}

async fn list_universities(
    State(state): State<AppState>,
    Path(city_id): Path<i64>,
) -> AppResult<Json<Vec<University>>> {
    let universities = locations::list_universities_by_city(state.db.pool(), city_id).await?;
    Ok(Json(universities))
}
