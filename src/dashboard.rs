use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::auth::session::Session;
use crate::client::{ExportFile, ExportFormat, HrBackend, ServerValidation};
use crate::error::{DashboardError, DashboardResult};
use crate::model::attendance::{AttendanceStats, AttendanceStatus};
use crate::model::department::Department;
use crate::model::employee::{Employee, EmployeeFilter};
use crate::model::holiday::Holiday;
use crate::model::leave_request::{LeaveAction, LeaveRequest};
use crate::model::month::MonthKey;
use crate::model::validation::{MissingSlot, ValidationSnapshot};
use crate::state::calendar::is_weekend;
use crate::state::completion::{Confirmation, ExportGate, GateOutcome, compute_completion};
use crate::state::grid::{AttendanceGrid, LoadOutcome};
use crate::state::holiday_store::HolidayStore;
use crate::state::holidays::HolidayRegistry;
use crate::utils::employee_cache::EmployeeDirectory;

const MISSING_PREVIEW: usize = 10;

#[derive(Debug, Serialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub day: u32,
    pub weekday: String,
    pub is_weekend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holiday: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmployeeRow {
    pub employee: Employee,
    pub cells: BTreeMap<NaiveDate, AttendanceStatus>,
    pub stats: AttendanceStats,
}

/// Completion banner shown above the grid.
#[derive(Debug, Serialize)]
pub struct CompletionBanner {
    pub completion_percentage: u32,
    pub total_expected: u32,
    pub total_marked: u32,
    pub missing_count: usize,
    pub working_days_count: u32,
    pub is_complete: bool,
    pub missing_preview: Vec<MissingSlot>,
}

impl From<&ValidationSnapshot> for CompletionBanner {
    fn from(snapshot: &ValidationSnapshot) -> Self {
        Self {
            completion_percentage: snapshot.completion_percentage,
            total_expected: snapshot.total_expected,
            total_marked: snapshot.total_marked,
            missing_count: snapshot.missing_count(),
            working_days_count: snapshot.working_days_count,
            is_complete: snapshot.is_complete(),
            missing_preview: snapshot.missing_preview(MISSING_PREVIEW).to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MonthView {
    pub month: MonthKey,
    pub label: String,
    pub previous: MonthKey,
    pub next: MonthKey,
    pub days: Vec<DayColumn>,
    pub rows: Vec<EmployeeRow>,
    pub holidays: Vec<Holiday>,
    pub holidays_degraded: bool,
    pub completion: CompletionBanner,
}

#[derive(Debug, Serialize)]
pub struct CellUpdate {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: Option<AttendanceStatus>,
    pub previous: Option<AttendanceStatus>,
    pub stats: AttendanceStats,
    pub completion_percentage: u32,
}

#[derive(Debug)]
pub enum ExportResult {
    File(ExportFile),
    NeedsConfirmation(GateOutcome),
    Cancelled,
}

/// Everything one browser session works with.
pub struct Dashboard {
    pub session: Arc<Session>,
    backend: Arc<dyn HrBackend>,
    pub grid: AttendanceGrid,
    pub holidays: HolidayRegistry,
    pub directory: EmployeeDirectory,
}

impl Dashboard {
    pub fn new(
        session: Arc<Session>,
        backend: Arc<dyn HrBackend>,
        holiday_store: HolidayStore,
        rollback_on_failure: bool,
        employee_ttl: Duration,
    ) -> Self {
        Self {
            session,
            grid: AttendanceGrid::new(backend.clone(), rollback_on_failure),
            holidays: HolidayRegistry::new(backend.clone(), holiday_store),
            directory: EmployeeDirectory::new(backend.clone(), employee_ttl),
            backend,
        }
    }

    /// Loads the month snapshot and refreshes holidays side by side, then
    /// renders the month.
    pub async fn open_overview(
        &self,
        month: MonthKey,
        filter: &EmployeeFilter,
    ) -> DashboardResult<MonthView> {
        let (loaded, refreshed) = futures::join!(self.grid.load_month(month), self.holidays.refresh());
        refreshed?;
        match loaded? {
            LoadOutcome::Loaded { employees, marks } => {
                info!(%month, employees, marks, "Overview opened");
                self.directory.seed(self.grid.roster()).await;
            }
            LoadOutcome::AlreadyLoading | LoadOutcome::Superseded => {}
        }
        Ok(self.month_view(month, filter))
    }

    /// Current state of `month`, without any backend call.
    pub fn month_view(&self, month: MonthKey, filter: &EmployeeFilter) -> MonthView {
        let days = month
            .days()
            .map(|date| DayColumn {
                date,
                day: date.day(),
                weekday: date.format("%a").to_string(),
                is_weekend: is_weekend(date),
                holiday: self.holidays.name_for(date),
            })
            .collect();

        let roster = self.grid.roster();
        let entries = self.grid.entries_for(month);
        let rows = filter
            .apply(&roster)
            .into_iter()
            .map(|employee| EmployeeRow {
                cells: entries.get(&employee.id).cloned().unwrap_or_default(),
                stats: self.grid.stats_for(employee.id, month),
                employee: employee.clone(),
            })
            .collect();

        let snapshot = compute_completion(month, &roster, &entries, |d| self.holidays.is_holiday(d));

        MonthView {
            month,
            label: month.label(),
            previous: month.previous(),
            next: month.next(),
            days,
            rows,
            holidays: self.holidays.in_month(month),
            holidays_degraded: self.holidays.is_degraded(),
            completion: CompletionBanner::from(&snapshot),
        }
    }

    pub async fn mark(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> DashboardResult<CellUpdate> {
        let previous = self
            .grid
            .mark_cell(employee_id, date, status, &self.holidays)
            .await?;
        Ok(self.cell_update(employee_id, date, previous))
    }

    pub async fn unmark(&self, employee_id: u64, date: NaiveDate) -> DashboardResult<CellUpdate> {
        let previous = self.grid.unmark_cell(employee_id, date).await?;
        Ok(self.cell_update(employee_id, date, previous))
    }

    fn cell_update(
        &self,
        employee_id: u64,
        date: NaiveDate,
        previous: Option<AttendanceStatus>,
    ) -> CellUpdate {
        let month = MonthKey::of(date);
        CellUpdate {
            employee_id,
            date,
            status: self.grid.status_of(employee_id, date),
            previous,
            stats: self.grid.stats_for(employee_id, month),
            completion_percentage: self.validate(month).completion_percentage,
        }
    }

    /// Removes every mark of the month. Refuses unless confirmed.
    pub async fn clear_month(&self, month: MonthKey, confirmed: bool) -> DashboardResult<usize> {
        if !confirmed {
            return Err(DashboardError::validation(format!(
                "Clearing {} removes every mark of the month and needs confirmation",
                month.label()
            )));
        }
        self.grid.clear_month(month).await
    }

    pub fn validate(&self, month: MonthKey) -> ValidationSnapshot {
        let roster = self.grid.roster();
        let entries = self.grid.entries_for(month);
        compute_completion(month, &roster, &entries, |d| self.holidays.is_holiday(d))
    }

    pub async fn server_validation(&self, month: MonthKey) -> DashboardResult<ServerValidation> {
        self.backend.validate_month(month).await
    }

    /// Exports `month` when it is complete or the user confirmed.
    pub async fn export(
        &self,
        month: MonthKey,
        format: ExportFormat,
        answer: Option<Confirmation>,
    ) -> DashboardResult<ExportResult> {
        if !self.grid.is_loaded(month) {
            info!(%month, "Loading month before export");
            if !matches!(self.grid.load_month(month).await?, LoadOutcome::Loaded { .. }) {
                return Err(DashboardError::validation(format!(
                    "{} is still loading, retry the export",
                    month.label()
                )));
            }
        }
        let snapshot = self.validate(month);
        match ExportGate::guard(&snapshot).resolve(answer) {
            GateOutcome::Export { force_full_month } => {
                let file = self
                    .backend
                    .export_month(month, format, force_full_month)
                    .await?;
                info!(%month, file = %file.file_name, force_full_month, "Export ready");
                Ok(ExportResult::File(file))
            }
            GateOutcome::Cancelled => Ok(ExportResult::Cancelled),
            prompt => Ok(ExportResult::NeedsConfirmation(prompt)),
        }
    }

    pub async fn departments(&self) -> DashboardResult<Vec<Department>> {
        self.backend.list_departments().await
    }

    pub async fn leaves(&self, status: Option<&str>) -> DashboardResult<Vec<LeaveRequest>> {
        let leaves = self.backend.list_leaves().await?;
        Ok(match status {
            Some(status) => leaves
                .into_iter()
                .filter(|l| l.status.eq_ignore_ascii_case(status))
                .collect(),
            None => leaves,
        })
    }

    pub async fn decide_leave(&self, leave_id: u64, action: LeaveAction) -> DashboardResult<()> {
        self.backend.decide_leave(leave_id, action).await?;
        info!(leave_id, %action, "Leave request decided");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeBackend;
    use crate::test_support::{dashboard_over, date};

    fn jan() -> MonthKey {
        MonthKey::new(2024, 1).unwrap()
    }

    #[actix_web::test]
    async fn overview_combines_snapshot_and_holidays() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe", "Jane Smith"]));
        backend.seed_holiday("New Year Day", date(2024, 1, 1));
        backend.seed_mark(1, date(2024, 1, 2), AttendanceStatus::Present);
        let dashboard = dashboard_over(backend.clone());

        let view = dashboard
            .open_overview(jan(), &EmployeeFilter::default())
            .await
            .unwrap();

        assert_eq!(view.label, "January 2024");
        assert_eq!(view.days.len(), 31);
        assert_eq!(view.days[0].holiday.as_deref(), Some("New Year Day"));
        assert!(view.days[5].is_weekend);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].stats.present, 1);
        assert_eq!(view.completion.working_days_count, 22);
        assert_eq!(view.completion.total_expected, 44);
        assert_eq!(view.completion.total_marked, 1);
        assert_eq!(view.completion.missing_preview.len(), MISSING_PREVIEW);

        dashboard.directory.all().await.unwrap();
        assert_eq!(backend.employee_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn incomplete_export_waits_for_confirmation() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe"]));
        let dashboard = dashboard_over(backend.clone());
        dashboard
            .open_overview(jan(), &EmployeeFilter::default())
            .await
            .unwrap();

        let prompt = dashboard.export(jan(), ExportFormat::Excel, None).await.unwrap();
        assert!(matches!(prompt, ExportResult::NeedsConfirmation(_)));
        let cancelled = dashboard
            .export(jan(), ExportFormat::Excel, Some(Confirmation::Cancel))
            .await
            .unwrap();
        assert!(matches!(cancelled, ExportResult::Cancelled));
        assert!(backend.exports.lock().unwrap().is_empty());

        let confirmed = dashboard
            .export(jan(), ExportFormat::Pdf, Some(Confirmation::Confirm))
            .await
            .unwrap();
        let ExportResult::File(file) = confirmed else {
            panic!("expected a file");
        };
        assert_eq!(file.file_name, "attendance_overview_2024-01.pdf");
        assert_eq!(
            backend.exports.lock().unwrap().as_slice(),
            &[(jan(), ExportFormat::Pdf, true)]
        );
    }

    #[actix_web::test]
    async fn export_before_any_overview_still_asks() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe", "Jane Smith"]));
        let dashboard = dashboard_over(backend.clone());

        let result = dashboard.export(jan(), ExportFormat::Excel, None).await.unwrap();

        let ExportResult::NeedsConfirmation(prompt) = result else {
            panic!("expected a confirmation prompt");
        };
        assert!(matches!(
            prompt,
            GateOutcome::AwaitingConfirmation { missing_count: 46, .. }
        ));
        assert!(backend.exports.lock().unwrap().is_empty());
        assert!(dashboard.grid.is_loaded(jan()));
    }

    #[actix_web::test]
    async fn complete_month_exports_without_asking() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe"]));
        let dashboard = dashboard_over(backend.clone());
        dashboard
            .open_overview(jan(), &EmployeeFilter::default())
            .await
            .unwrap();
        for date in jan().days().filter(|d| !is_weekend(*d)) {
            dashboard.mark(1, date, AttendanceStatus::Present).await.unwrap();
        }

        let result = dashboard.export(jan(), ExportFormat::Excel, None).await.unwrap();

        assert!(matches!(result, ExportResult::File(_)));
        assert_eq!(
            backend.exports.lock().unwrap().as_slice(),
            &[(jan(), ExportFormat::Excel, false)]
        );
    }

    #[actix_web::test]
    async fn mark_reports_new_completion() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe"]));
        let dashboard = dashboard_over(backend);
        dashboard
            .open_overview(jan(), &EmployeeFilter::default())
            .await
            .unwrap();

        let update = dashboard
            .mark(1, date(2024, 1, 2), AttendanceStatus::HalfDay)
            .await
            .unwrap();

        assert_eq!(update.status, Some(AttendanceStatus::HalfDay));
        assert_eq!(update.stats.half_day, 1);
        // 1 / 23
        assert_eq!(update.completion_percentage, 4);

        let update = dashboard.unmark(1, date(2024, 1, 2)).await.unwrap();
        assert_eq!(update.previous, Some(AttendanceStatus::HalfDay));
        assert_eq!(update.completion_percentage, 0);
    }

    #[actix_web::test]
    async fn clearing_a_month_needs_confirmation() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe"]));
        let dashboard = dashboard_over(backend);
        dashboard
            .open_overview(jan(), &EmployeeFilter::default())
            .await
            .unwrap();
        dashboard
            .mark(1, date(2024, 1, 2), AttendanceStatus::Present)
            .await
            .unwrap();

        assert!(dashboard.clear_month(jan(), false).await.is_err());
        assert_eq!(dashboard.grid.status_of(1, date(2024, 1, 2)), Some(AttendanceStatus::Present));
        assert_eq!(dashboard.clear_month(jan(), true).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn leaves_filter_by_status_and_decide() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe"]));
        backend.leaves.lock().unwrap().push(LeaveRequest {
            id: 5,
            employee_id: 1,
            employee_name: Some("John Doe".into()),
            leave_type: "annual".into(),
            start_date: date(2024, 1, 8),
            end_date: date(2024, 1, 9),
            days_count: Some(2),
            reason: None,
            status: "pending".into(),
        });
        let dashboard = dashboard_over(backend);

        assert_eq!(dashboard.leaves(Some("Pending")).await.unwrap().len(), 1);
        dashboard.decide_leave(5, LeaveAction::Approve).await.unwrap();
        assert!(dashboard.leaves(Some("pending")).await.unwrap().is_empty());
        assert_eq!(dashboard.leaves(None).await.unwrap()[0].status, "approved");
    }
}
