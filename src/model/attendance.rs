use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Status a single calendar cell can hold.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    #[serde(alias = "halfday")]
    #[strum(to_string = "half_day", serialize = "halfday")]
    HalfDay,
    Absent,
    Leave,
    Overtime,
}

/// How a status is drawn in the grid and the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub label: &'static str,
    pub glyph: &'static str,
    pub color: &'static str,
}

// indexed by `AttendanceStatus as usize`
static STATUS_STYLES: [StatusStyle; 5] = [
    StatusStyle { label: "Full Day", glyph: "✅", color: "green" },
    StatusStyle { label: "Half Day", glyph: "🌗", color: "yellow" },
    StatusStyle { label: "Absent", glyph: "❌", color: "red" },
    StatusStyle { label: "Leave", glyph: "🌴", color: "blue" },
    StatusStyle { label: "Overtime", glyph: "⏰", color: "purple" },
];

impl AttendanceStatus {
    pub fn style(self) -> &'static StatusStyle {
        &STATUS_STYLES[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.style().label
    }

    pub fn glyph(self) -> &'static str {
        self.style().glyph
    }
}

/// One mark as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// Per-status counts for one employee over one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceStats {
    pub present: u32,
    pub half_day: u32,
    pub absent: u32,
    pub leave: u32,
    pub overtime: u32,
}

impl AttendanceStats {
    pub fn record(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::HalfDay => self.half_day += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Leave => self.leave += 1,
            AttendanceStatus::Overtime => self.overtime += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.present + self.half_day + self.absent + self.leave + self.overtime
    }
}
