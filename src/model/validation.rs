use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::month::MonthKey;

/// A working-day slot with no mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MissingSlot {
    pub employee_id: u64,
    pub employee_name: String,
    #[schema(example = "2024-01-02", format = "date", value_type = String)]
    pub date: NaiveDate,
}

/// Completion of one month, derived from roster, marks and holidays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationSnapshot {
    #[schema(value_type = String, example = "2024-01")]
    pub month: MonthKey,
    pub total_expected: u32,
    pub total_marked: u32,
    /// Rounded to a whole percent, always within 0..=100.
    pub completion_percentage: u32,
    pub working_days_count: u32,
    pub employees_count: u32,
    pub missing: Vec<MissingSlot>,
}

impl ValidationSnapshot {
    /// Exact completeness; a rounded 100% with one gap is still incomplete.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    pub fn missing_preview(&self, limit: usize) -> &[MissingSlot] {
        &self.missing[..self.missing.len().min(limit)]
    }
}
