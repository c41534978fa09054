use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ProxyError;
use crate::AppState;

pub const ROVERS: [&str; 4] = ["curiosity", "opportunity", "spirit", "perseverance"];

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, ProxyError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ProxyError::InvalidDate(raw.to_string()))
}

fn required_date(raw: Option<&str>, name: &'static str) -> Result<NaiveDate, ProxyError> {
    parse_date(raw.ok_or(ProxyError::MissingParameter(name))?)
}

fn rover_slug(raw: &str) -> Result<&'static str, ProxyError> {
    ROVERS
        .into_iter()
        .find(|rover| rover.eq_ignore_ascii_case(raw))
        .ok_or_else(|| ProxyError::UnknownRover(raw.to_string()))
}

pub async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub async fn get_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ProxyError> {
    let date = required_date(query.date.as_deref(), "date")?;
    let request = state.upstream.apod_image(date)?;
    state.upstream.forward(request).await
}

pub async fn get_images(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Response, ProxyError> {
    let start = required_date(query.start_date.as_deref(), "start_date")?;
    let end = required_date(query.end_date.as_deref(), "end_date")?;
    if start > end {
        return Err(ProxyError::ReversedRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    let request = state.upstream.apod_range(start, end)?;
    state.upstream.forward(request).await
}

pub async fn get_latest(State(state): State<AppState>) -> Result<Response, ProxyError> {
    let request = state.upstream.epic_latest()?;
    state.upstream.forward(request).await
}

pub async fn get_manifest(
    State(state): State<AppState>,
    Path(rover): Path<String>,
) -> Result<Response, ProxyError> {
    let request = state.upstream.rover_manifest(rover_slug(&rover)?)?;
    state.upstream.forward(request).await
}

pub async fn get_rover_photos(
    State(state): State<AppState>,
    Path((rover, date)): Path<(String, String)>,
) -> Result<Response, ProxyError> {
    let rover = rover_slug(&rover)?;
    let date = parse_date(&date)?;
    let request = state.upstream.rover_photos(rover, date)?;
    state.upstream.forward(request).await
}
