use crate::models::{EventRecord, EventTable};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Date range and behavior selection applied before every aggregation
/// except repurchase rate.
///
/// `None` in either field means "no restriction". An empty behavior set
/// accepts nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub behaviors: Option<BTreeSet<String>>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive on both ends.
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    pub fn with_behaviors<I, S>(mut self, behaviors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.behaviors = Some(behaviors.into_iter().map(Into::into).collect());
        self
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        if let Some((start, end)) = self.date_range {
            let date = event.date();
            if date < start || date > end {
                return false;
            }
        }
        match &self.behaviors {
            Some(accepted) => accepted.contains(&event.behavior_type),
            None => true,
        }
    }

    /// Returns the matching events as a new table; `table` is left untouched.
    pub fn apply(&self, table: &EventTable) -> EventTable {
        let events = table
            .events
            .iter()
            .filter(|event| self.matches(event))
            .cloned()
            .collect();
        EventTable::new(events)
    }
}
