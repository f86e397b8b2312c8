use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::model::employee::Employee;
use crate::model::month::MonthKey;
use crate::model::validation::{MissingSlot, ValidationSnapshot};
use crate::state::calendar::working_days;
use crate::state::grid::AttendanceMap;

/// Completion of `month` for `roster`. Pure: same inputs, same snapshot.
///
/// Only working days count. Marks on weekends, holidays or for employees
/// outside the roster are ignored.
pub fn compute_completion<F>(
    month: MonthKey,
    roster: &[Employee],
    marks: &AttendanceMap,
    is_holiday: F,
) -> ValidationSnapshot
where
    F: Fn(chrono::NaiveDate) -> bool,
{
    let days = working_days(month, is_holiday);
    let total_expected = (roster.len() * days.len()) as u32;

    let mut total_marked = 0u32;
    let mut missing = Vec::new();
    for employee in roster {
        let row = marks.get(&employee.id);
        for date in &days {
            if row.is_some_and(|r| r.contains_key(date)) {
                total_marked += 1;
            } else {
                missing.push(MissingSlot {
                    employee_id: employee.id,
                    employee_name: employee.name.clone(),
                    date: *date,
                });
            }
        }
    }

    let completion_percentage = if total_expected == 0 {
        100
    } else {
        (f64::from(total_marked) / f64::from(total_expected) * 100.0).round() as u32
    };

    ValidationSnapshot {
        month,
        total_expected,
        total_marked,
        completion_percentage,
        working_days_count: days.len() as u32,
        employees_count: roster.len() as u32,
        missing,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Confirm,
    Cancel,
}

/// Gate in front of the month export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportGate {
    Complete,
    Incomplete {
        missing_count: usize,
        completion_percentage: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    Export { force_full_month: bool },
    AwaitingConfirmation {
        missing_count: usize,
        completion_percentage: u32,
    },
    Cancelled,
}

impl ExportGate {
    pub fn guard(snapshot: &ValidationSnapshot) -> Self {
        if snapshot.is_complete() {
            ExportGate::Complete
        } else {
            ExportGate::Incomplete {
                missing_count: snapshot.missing_count(),
                completion_percentage: snapshot.completion_percentage,
            }
        }
    }

    /// A complete month exports without asking; an incomplete one waits
    /// for an answer and exports the full month only when confirmed.
    pub fn resolve(self, answer: Option<Confirmation>) -> GateOutcome {
        let outcome = match (self, answer) {
            (ExportGate::Complete, _) => GateOutcome::Export {
                force_full_month: false,
            },
            (
                ExportGate::Incomplete {
                    missing_count,
                    completion_percentage,
                },
                None,
            ) => GateOutcome::AwaitingConfirmation {
                missing_count,
                completion_percentage,
            },
            (ExportGate::Incomplete { .. }, Some(Confirmation::Confirm)) => GateOutcome::Export {
                force_full_month: true,
            },
            (ExportGate::Incomplete { .. }, Some(Confirmation::Cancel)) => GateOutcome::Cancelled,
        };
        debug!(gate = ?self, ?answer, ?outcome, "Export gate resolved");
        outcome
    }
}
