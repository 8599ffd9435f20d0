use crate::models::DayHistoryEntry;
use chrono::{Local, NaiveDate};

pub const HISTORY_LIMIT: usize = 7;

/// Rolling per-day completion history, in save order, capped at
/// [`HISTORY_LIMIT`] entries. Eviction is FIFO by insertion, not by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<DayHistoryEntry>,
}

impl History {
    pub fn from_entries(mut entries: Vec<DayHistoryEntry>) -> Self {
        truncate_front(&mut entries);
        Self { entries }
    }

    pub fn entries(&self) -> &[DayHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, date: &str) -> Option<&DayHistoryEntry> {
        self.entries.iter().find(|entry| entry.date == date)
    }

    pub fn record_today(&mut self, completed: u32, total: u32) -> &[DayHistoryEntry] {
        self.record_on(&date_label(Local::now().date_naive()), completed, total)
    }

    /// Overwrites the counts for `date` if it is already present, otherwise
    /// appends and drops the oldest insertions beyond the limit.
    pub fn record_on(&mut self, date: &str, completed: u32, total: u32) -> &[DayHistoryEntry] {
        match self.entries.iter_mut().find(|entry| entry.date == date) {
            Some(entry) => {
                entry.completed_count = completed;
                entry.total_count = total;
            }
            None => {
                self.entries.push(DayHistoryEntry {
                    date: date.to_string(),
                    completed_count: completed,
                    total_count: total,
                });
                truncate_front(&mut self.entries);
            }
        }
        &self.entries
    }
}

fn truncate_front(entries: &mut Vec<DayHistoryEntry>) {
    if entries.len() > HISTORY_LIMIT {
        let excess = entries.len() - HISTORY_LIMIT;
        entries.drain(..excess);
    }
}

/// Russian locale calendar date, e.g. `01.01.2024`.
pub fn date_label(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}
