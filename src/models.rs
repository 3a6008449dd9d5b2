use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

pub const PAGE_VIEW: &str = "pv";
pub const FAVORITE: &str = "fav";
pub const CART: &str = "cart";
pub const PURCHASE: &str = "buy";

/// The four behavior types the event log is expected to contain.
pub const KNOWN_BEHAVIORS: [&str; 4] = [PAGE_VIEW, FAVORITE, CART, PURCHASE];

pub const HOURS_PER_DAY: usize = 24;

/// One row of the event log.
///
/// `datetime` is derived from `timestamp` at load time (epoch seconds read as
/// naive UTC) and is the single source for `date()` and `hour()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub user_id: i64,
    pub item_id: i64,
    pub category_id: i64,
    pub behavior_type: String,
    pub timestamp: i64,
    pub datetime: NaiveDateTime,
}

impl EventRecord {
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    pub fn hour(&self) -> u32 {
        self.datetime.hour()
    }

    pub fn is(&self, behavior: &str) -> bool {
        self.behavior_type == behavior
    }
}

/// The loaded event log. Never mutated after loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTable {
    pub events: Vec<EventRecord>,
}

impl EventTable {
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct behavior types in order of first appearance.
    pub fn behavior_types(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for event in &self.events {
            if !seen.iter().any(|b| *b == event.behavior_type) {
                seen.push(event.behavior_type.clone());
            }
        }
        seen
    }

    /// First and last calendar date in the log, if any.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.events.iter().map(EventRecord::date).min()?;
        let last = self.events.iter().map(EventRecord::date).max()?;
        Some((first, last))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvUv {
    pub pv: u64,
    pub uv: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyCount {
    pub hour: u32,
    pub behavior_type: String,
    pub count: u64,
}

/// Sparse (hour, behavior) counts. Only combinations that occur are listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyDistribution {
    pub buckets: Vec<HourlyCount>,
}

impl HourlyDistribution {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, hour: u32, behavior: &str) -> u64 {
        self.buckets
            .iter()
            .find(|b| b.hour == hour && b.behavior_type == behavior)
            .map_or(0, |b| b.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionFunnel {
    pub stages: Vec<FunnelStage>,
}

impl ConversionFunnel {
    pub fn count(&self, stage: &str) -> u64 {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map_or(0, |s| s.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub behavior_type: String,
    pub counts: Vec<u64>,
}

impl HeatmapRow {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Dense behavior x hour matrix. Every row has exactly 24 cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorHeatmap {
    pub hours: Vec<u32>,
    pub rows: Vec<HeatmapRow>,
}

impl BehaviorHeatmap {
    pub fn row(&self, behavior: &str) -> Option<&HeatmapRow> {
        self.rows.iter().find(|r| r.behavior_type == behavior)
    }

    pub fn max_count(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|r| r.counts.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTrendPoint {
    pub date: NaiveDate,
    pub pv: u64,
    pub uv: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RepurchaseStats {
    pub total_buyers: u64,
    pub repurchasing_buyers: u64,
    pub repurchase_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub filtered_rows: u64,
    pub pv_uv: PvUv,
    pub hourly: HourlyDistribution,
    pub funnel: ConversionFunnel,
    pub heatmap: BehaviorHeatmap,
    pub daily_trend: Vec<DailyTrendPoint>,
    /// Computed over the whole log; date and behavior filters do not apply.
    pub repurchase: RepurchaseStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub behavior_types: Vec<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}
