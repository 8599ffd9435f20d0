use crate::models::{ChecklistItem, ChecklistResponse};

const DEFAULT_ITEMS: [(&str, &str); 5] = [
    ("pill", "Таблетка принята утром натощак"),
    ("energy", "Уровень энергии в норме"),
    ("mood", "Настроение стабильное"),
    ("noSwelling", "Нет новых отеков"),
    ("normalTemp", "Не жалуется на холод"),
];

/// The daily yes/no items. The set is fixed at construction; only the
/// `checked` flags change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checklist {
    items: Vec<ChecklistItem>,
}

impl Default for Checklist {
    fn default() -> Self {
        Self::new(
            DEFAULT_ITEMS
                .iter()
                .map(|(id, label)| (id.to_string(), label.to_string())),
        )
    }
}

impl Checklist {
    pub fn new(items: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|(id, label)| ChecklistItem {
                    id,
                    label,
                    checked: false,
                })
                .collect(),
        }
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    /// Flips the item with the given id. Returns `false` when nothing matched.
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.checked = !item.checked;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        for item in &mut self.items {
            item.checked = false;
        }
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.checked).count()
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn progress_percent(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.total() as f64 * 100.0
    }

    pub fn to_response(&self) -> ChecklistResponse {
        ChecklistResponse {
            items: self.items.clone(),
            completed_count: self.completed_count(),
            total_count: self.total(),
            progress_percent: self.progress_percent(),
        }
    }
}
