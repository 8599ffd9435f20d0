use crate::checklist::Checklist;
use crate::errors::StoreError;
use crate::export::{ExportGate, ReportSnapshot};
use crate::history::{date_label, History};
use crate::models::DayHistoryEntry;
use crate::stats::{average_percent, last_n_days_at, WINDOW_DAYS};
use crate::storage::LocalStore;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mutable page state: today's checklist and the saved history, plus the
/// store the history is mirrored into.
#[derive(Debug)]
pub struct Session {
    pub checklist: Checklist,
    pub history: History,
    pub store: LocalStore,
}

impl Session {
    pub fn hydrate(store: LocalStore) -> Self {
        Self {
            checklist: Checklist::default(),
            history: History::from_entries(store.read_history()),
            store,
        }
    }

    /// Folds the checklist into the history entry for `today`, persists it and
    /// clears the checklist. Nothing changes if the write fails.
    pub async fn save_day_on(&mut self, today: NaiveDate) -> Result<&[DayHistoryEntry], StoreError> {
        let mut next = self.history.clone();
        next.record_on(
            &date_label(today),
            self.checklist.completed_count() as u32,
            self.checklist.total() as u32,
        );
        self.store.write_history(next.entries()).await?;
        self.history = next;
        self.checklist.reset();
        Ok(self.history.entries())
    }

    /// Replaces the whole history, e.g. with one decoded from a share token.
    pub async fn replace_history(&mut self, entries: Vec<DayHistoryEntry>) -> Result<(), StoreError> {
        let next = History::from_entries(entries);
        self.store.write_history(next.entries()).await?;
        self.history = next;
        Ok(())
    }

    pub fn snapshot_at(&self, today: NaiveDate) -> ReportSnapshot {
        let days = last_n_days_at(today, &self.history, WINDOW_DAYS);
        ReportSnapshot {
            items: self.checklist.items().to_vec(),
            progress_percent: self.checklist.progress_percent(),
            average_percent: average_percent(&days),
            days,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub public_url: String,
    pub session: Arc<Mutex<Session>>,
    pub export: ExportGate,
}

impl AppState {
    pub fn new(public_url: String, store: LocalStore) -> Self {
        Self {
            public_url,
            session: Arc::new(Mutex::new(Session::hydrate(store))),
            export: ExportGate::default(),
        }
    }
}
