use crate::errors::AppError;
use crate::filter::EventFilter;
use crate::models::{DashboardResponse, FilterOptions};
use crate::state::AppState;
use crate::stats::{build_dashboard, filter_options};
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::error;

/// Raw query pairs. Kept as a list so `behaviors` may repeat, as it does
/// when submitted from the dashboard's checkboxes.
type FilterParams = Vec<(String, String)>;

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Html<String>, AppError> {
    let filter = parse_filter(&params)?;
    let table = state.table().await.inspect_err(|err| {
        error!("failed to load event log: {err}");
    })?;

    let options = filter_options(&table);
    let dashboard = build_dashboard(&table, &filter);
    Ok(Html(render_index(&options, &filter, &dashboard)))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<DashboardResponse>, AppError> {
    let filter = parse_filter(&params)?;
    let table = state.table().await.inspect_err(|err| {
        error!("failed to load event log: {err}");
    })?;

    Ok(Json(build_dashboard(&table, &filter)))
}

pub async fn get_filters(State(state): State<AppState>) -> Result<Json<FilterOptions>, AppError> {
    let table = state.table().await?;
    Ok(Json(filter_options(&table)))
}

/// Builds the filter from `start`, `end` and `behaviors` parameters.
///
/// The date range only applies when both ends are given. Any `behaviors`
/// key switches to an explicit selection; its values are comma-separated
/// and blank values contribute nothing.
pub fn parse_filter(params: &[(String, String)]) -> Result<EventFilter, AppError> {
    let mut start = None;
    let mut end = None;
    let mut behaviors: Option<BTreeSet<String>> = None;

    for (key, value) in params {
        match key.as_str() {
            "start" => start = parse_date("start", value)?,
            "end" => end = parse_date("end", value)?,
            "behaviors" => {
                let selected = behaviors.get_or_insert_with(BTreeSet::new);
                selected.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|b| !b.is_empty())
                        .map(str::to_string),
                );
            }
            _ => {}
        }
    }

    let mut filter = EventFilter::new();
    if let (Some(start), Some(end)) = (start, end) {
        filter = filter.with_date_range(start, end);
    }
    filter.behaviors = behaviors;
    Ok(filter)
}

fn parse_date(name: &str, value: &str) -> Result<Option<NaiveDate>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| AppError::bad_request(format!("{name} must be a YYYY-MM-DD date")))
}
