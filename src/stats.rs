use crate::history::{date_label, History};
use crate::models::{DayPoint, StatsResponse};
use chrono::{Duration, Local, NaiveDate};

pub const WINDOW_DAYS: usize = 7;

pub fn build_stats(history: &History) -> StatsResponse {
    build_stats_at(Local::now().date_naive(), history)
}

pub fn build_stats_at(today: NaiveDate, history: &History) -> StatsResponse {
    let last_7_days = last_n_days_at(today, history, WINDOW_DAYS);
    let average_percent = average_percent(&last_7_days);
    let recorded_days = last_7_days.iter().filter(|day| day.total_count > 0).count();

    StatsResponse {
        last_7_days,
        average_percent,
        recorded_days,
    }
}

pub fn last_n_days(history: &History, n: usize) -> Vec<DayPoint> {
    last_n_days_at(Local::now().date_naive(), history, n)
}

/// `n` calendar days ending at `today`, oldest first. Days without a saved
/// entry are zero-filled.
pub fn last_n_days_at(today: NaiveDate, history: &History, n: usize) -> Vec<DayPoint> {
    (0..n)
        .rev()
        .map(|offset| {
            let date = date_label(today - Duration::days(offset as i64));
            match history.get(&date) {
                Some(entry) => DayPoint {
                    percentage: entry.percentage(),
                    completed_count: entry.completed_count,
                    total_count: entry.total_count,
                    date,
                },
                None => DayPoint {
                    date,
                    completed_count: 0,
                    total_count: 0,
                    percentage: 0,
                },
            }
        })
        .collect()
}

/// Mean percentage over every day in the window, empty days included.
pub fn average_percent(days: &[DayPoint]) -> f64 {
    if days.is_empty() {
        return 0.0;
    }
    let sum: f64 = days.iter().map(|day| f64::from(day.percentage)).sum();
    sum / days.len() as f64
}
