use serde::{Deserialize, Serialize};

/// A sellable home model. Read-only reference data for the dashboard's
/// inventory tab and for follow-up text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryModel {
    pub id: String,
    pub name: String,
    pub base_price: f64,
    pub beds: f64,
    pub baths: f64,
    pub sqft: i64,
    pub garage: Option<i64>,
    pub active: bool,
}

impl InventoryModel {
    /// Display string for prompts and emails, e.g. "The Aspen ($450,000)".
    pub fn display_line(&self) -> String {
        format!("{} (${})", self.name, group_thousands(self.base_price.round() as i64))
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
