use crate::filter::EventFilter;
use crate::models::{
    BehaviorHeatmap, ConversionFunnel, DailyTrendPoint, DashboardResponse, EventTable,
    FilterOptions, FunnelStage, HeatmapRow, HourlyCount, HourlyDistribution, PvUv,
    RepurchaseStats, CART, FAVORITE, HOURS_PER_DAY, KNOWN_BEHAVIORS, PAGE_VIEW, PURCHASE,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

pub const STAGE_VIEW: &str = "View";
pub const STAGE_FAVORITE_CART: &str = "Favorite + Cart";
pub const STAGE_PURCHASE: &str = "Purchase";

/// Runs every aggregation for one dashboard render.
///
/// All metrics see `filter` applied, except repurchase which always covers
/// the full table.
pub fn build_dashboard(table: &EventTable, filter: &EventFilter) -> DashboardResponse {
    let filtered = filter.apply(table);
    debug!(
        total = table.len(),
        filtered = filtered.len(),
        "building dashboard"
    );

    DashboardResponse {
        filtered_rows: filtered.len() as u64,
        pv_uv: pv_uv(&filtered),
        hourly: hourly_distribution(&filtered),
        funnel: conversion_funnel(&filtered),
        heatmap: behavior_heatmap(&filtered),
        daily_trend: daily_trend(&filtered),
        repurchase: repurchase_rate(table),
    }
}

pub fn filter_options(table: &EventTable) -> FilterOptions {
    let bounds = table.date_bounds();
    FilterOptions {
        behavior_types: table.behavior_types(),
        min_date: bounds.map(|(first, _)| first),
        max_date: bounds.map(|(_, last)| last),
    }
}

pub fn pv_uv(table: &EventTable) -> PvUv {
    let pv = table.events.iter().filter(|e| e.is(PAGE_VIEW)).count() as u64;
    let uv = table
        .events
        .iter()
        .map(|e| e.user_id)
        .collect::<HashSet<_>>()
        .len() as u64;
    PvUv { pv, uv }
}

pub fn hourly_distribution(table: &EventTable) -> HourlyDistribution {
    let mut counts: BTreeMap<(u32, &str), u64> = BTreeMap::new();
    for event in &table.events {
        *counts
            .entry((event.hour(), event.behavior_type.as_str()))
            .or_default() += 1;
    }

    let buckets = counts
        .into_iter()
        .map(|((hour, behavior), count)| HourlyCount {
            hour,
            behavior_type: behavior.to_string(),
            count,
        })
        .collect();
    HourlyDistribution { buckets }
}

/// Stage volumes are counted independently of each other, so a user may
/// appear in `Purchase` without ever appearing in `View`.
pub fn conversion_funnel(table: &EventTable) -> ConversionFunnel {
    let by_behavior = counts_by_behavior(table);
    let count = |behavior: &str| by_behavior.get(behavior).copied().unwrap_or(0);

    ConversionFunnel {
        stages: vec![
            FunnelStage {
                stage: STAGE_VIEW.to_string(),
                count: count(PAGE_VIEW),
            },
            FunnelStage {
                stage: STAGE_FAVORITE_CART.to_string(),
                count: count(FAVORITE) + count(CART),
            },
            FunnelStage {
                stage: STAGE_PURCHASE.to_string(),
                count: count(PURCHASE),
            },
        ],
    }
}

/// Rows always include the four known behaviors plus any other type seen,
/// sorted lexically; every row has one cell per hour.
pub fn behavior_heatmap(table: &EventTable) -> BehaviorHeatmap {
    let mut rows: BTreeMap<&str, Vec<u64>> = KNOWN_BEHAVIORS
        .iter()
        .map(|behavior| (*behavior, vec![0; HOURS_PER_DAY]))
        .collect();

    for event in &table.events {
        let cells = rows
            .entry(event.behavior_type.as_str())
            .or_insert_with(|| vec![0; HOURS_PER_DAY]);
        cells[event.hour() as usize] += 1;
    }

    BehaviorHeatmap {
        hours: (0..HOURS_PER_DAY as u32).collect(),
        rows: rows
            .into_iter()
            .map(|(behavior, counts)| HeatmapRow {
                behavior_type: behavior.to_string(),
                counts,
            })
            .collect(),
    }
}

pub fn daily_trend(table: &EventTable) -> Vec<DailyTrendPoint> {
    let mut days: BTreeMap<NaiveDate, (u64, HashSet<i64>)> = BTreeMap::new();
    for event in &table.events {
        let (pv, users) = days.entry(event.date()).or_default();
        if event.is(PAGE_VIEW) {
            *pv += 1;
        }
        users.insert(event.user_id);
    }

    days.into_iter()
        .map(|(date, (pv, users))| DailyTrendPoint {
            date,
            pv,
            uv: users.len() as u64,
        })
        .collect()
}

/// Share of buyers with at least two purchases. Pass the unfiltered table.
pub fn repurchase_rate(table: &EventTable) -> RepurchaseStats {
    let mut purchases: HashMap<i64, u64> = HashMap::new();
    for event in table.events.iter().filter(|e| e.is(PURCHASE)) {
        *purchases.entry(event.user_id).or_default() += 1;
    }

    let total_buyers = purchases.len() as u64;
    let repurchasing_buyers = purchases.values().filter(|count| **count > 1).count() as u64;
    let repurchase_rate = if total_buyers > 0 {
        repurchasing_buyers as f64 / total_buyers as f64
    } else {
        0.0
    };

    RepurchaseStats {
        total_buyers,
        repurchasing_buyers,
        repurchase_rate,
    }
}

fn counts_by_behavior(table: &EventTable) -> HashMap<&str, u64> {
    let mut counts = HashMap::new();
    for event in &table.events {
        *counts.entry(event.behavior_type.as_str()).or_default() += 1;
    }
    counts
}
