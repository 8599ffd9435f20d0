use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

/// One day's checklist completion, keyed by its `DD.MM.YYYY` date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHistoryEntry {
    pub date: String,
    pub completed_count: u32,
    pub total_count: u32,
}

impl DayHistoryEntry {
    pub fn percentage(&self) -> u32 {
        percentage(self.completed_count, self.total_count)
    }
}

/// Completion as a whole percentage, clamped to 0..=100.
pub fn percentage(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(completed) / f64::from(total) * 100.0)
        .round()
        .clamp(0.0, 100.0) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPoint {
    pub date: String,
    pub completed_count: u32,
    pub total_count: u32,
    pub percentage: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub last_7_days: Vec<DayPoint>,
    pub average_percent: f64,
    pub recorded_days: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistResponse {
    pub items: Vec<ChecklistItem>,
    pub completed_count: usize,
    pub total_count: usize,
    pub progress_percent: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<DayHistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareLinkResponse {
    pub url: String,
    pub token: String,
    pub title: String,
    pub text: String,
    /// `native` or `clipboard`.
    pub method: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShareLinkQuery {
    /// Whether the page has a platform share sheet.
    #[serde(default)]
    pub native: bool,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareReportRequest {
    #[serde(default)]
    pub method: Option<String>,
    pub name: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareReportResponse {
    pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub share: Option<String>,
    pub notice: Option<String>,
}
