//! Contract with the HR backend.
//!
//! Everything the dashboard persists goes through [`HrBackend`]. The
//! production implementation is [`http::HttpBackend`]; tests swap in the
//! in-memory fake.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::DashboardResult;
use crate::model::attendance::AttendanceRecord;
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::holiday::{Holiday, HolidayId, NewHoliday};
use crate::model::leave_request::{LeaveAction, LeaveRequest};
use crate::model::month::MonthKey;

pub mod http;

#[cfg(test)]
pub mod fake;

/// `GET /attendance/overview` body.
///
/// Statuses stay raw strings here; the grid drops anything it cannot parse
/// instead of failing the whole month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthSnapshot {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub attendance_data: HashMap<String, HashMap<String, String>>,
}

/// `GET /attendance/validate` body, the backend's own completion count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServerValidation {
    pub is_complete: bool,
    pub total_expected: u32,
    pub total_marked: u32,
    pub missing_count: u32,
    pub completion_percentage: f64,
    #[serde(default)]
    pub working_days_count: u32,
    #[serde(default)]
    pub employees_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn path(self) -> &'static str {
        match self {
            ExportFormat::Excel => "/attendance/export",
            ExportFormat::Pdf => "/attendance/export-pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// `attendance_overview_2024-01.xlsx`
    pub fn file_name(self, month: MonthKey) -> String {
        format!("attendance_overview_{}.{}", month, self.extension())
    }
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Bytes,
}

#[async_trait]
pub trait HrBackend: Send + Sync {
    async fn list_employees(&self) -> DashboardResult<Vec<Employee>>;

    async fn list_departments(&self) -> DashboardResult<Vec<Department>>;

    async fn month_snapshot(&self, month: MonthKey) -> DashboardResult<MonthSnapshot>;

    /// Idempotent upsert of one cell.
    async fn mark_attendance(&self, record: &AttendanceRecord) -> DashboardResult<()>;

    async fn unmark_attendance(&self, employee_id: u64, date: NaiveDate) -> DashboardResult<()>;

    async fn clear_month(&self, month: MonthKey) -> DashboardResult<()>;

    async fn clear_date(&self, date: NaiveDate) -> DashboardResult<()>;

    async fn list_holidays(&self) -> DashboardResult<Vec<Holiday>>;

    async fn add_holiday(&self, holiday: &NewHoliday) -> DashboardResult<Holiday>;

    async fn delete_holiday(&self, id: HolidayId) -> DashboardResult<()>;

    async fn validate_month(&self, month: MonthKey) -> DashboardResult<ServerValidation>;

    async fn export_month(
        &self,
        month: MonthKey,
        format: ExportFormat,
        force_full_month: bool,
    ) -> DashboardResult<ExportFile>;

    async fn list_leaves(&self) -> DashboardResult<Vec<LeaveRequest>>;

    async fn decide_leave(&self, leave_id: u64, action: LeaveAction) -> DashboardResult<()>;
}
