//! In-memory backend with failure injection for tests.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;

use crate::client::{ExportFile, ExportFormat, HrBackend, MonthSnapshot, ServerValidation};
use crate::error::{DashboardError, DashboardResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::holiday::{Holiday, HolidayId, NewHoliday};
use crate::model::leave_request::{LeaveAction, LeaveRequest};
use crate::model::month::MonthKey;

struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub employees: Mutex<Vec<Employee>>,
    pub attendance: Mutex<HashMap<u64, BTreeMap<NaiveDate, AttendanceStatus>>>,
    pub holidays: Mutex<Vec<Holiday>>,
    pub leaves: Mutex<Vec<LeaveRequest>>,
    pub exports: Mutex<Vec<(MonthKey, ExportFormat, bool)>>,
    /// Every call fails with a network error while set.
    pub offline: AtomicBool,
    /// Only writes fail while set.
    pub reject_writes: AtomicBool,
    pub employee_calls: AtomicUsize,
    pub snapshot_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    next_holiday_id: AtomicU64,
}

pub fn employee(id: u64, name: &str) -> Employee {
    Employee {
        id,
        code: Some(format!("EMP-{:03}", id)),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: None,
        department_id: None,
        department: Some("Engineering".to_string()),
        position: None,
        is_active: true,
    }
}

impl FakeBackend {
    pub fn with_employees(names: &[&str]) -> Self {
        let backend = Self::default();
        *backend.employees.lock().unwrap() = names
            .iter()
            .enumerate()
            .map(|(i, name)| employee(i as u64 + 1, name))
            .collect();
        backend.next_holiday_id.store(100, Ordering::SeqCst);
        backend
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    pub fn stored(&self, employee_id: u64, date: NaiveDate) -> Option<AttendanceStatus> {
        self.attendance
            .lock()
            .unwrap()
            .get(&employee_id)
            .and_then(|days| days.get(&date).copied())
    }

    pub fn seed_mark(&self, employee_id: u64, date: NaiveDate, status: AttendanceStatus) {
        self.attendance
            .lock()
            .unwrap()
            .entry(employee_id)
            .or_default()
            .insert(date, status);
    }

    pub fn seed_holiday(&self, name: &str, date: NaiveDate) -> HolidayId {
        let id = HolidayId::Remote(self.next_holiday_id.fetch_add(1, Ordering::SeqCst));
        self.holidays.lock().unwrap().push(Holiday {
            id,
            name: name.to_string(),
            date,
            description: None,
        });
        id
    }

    fn reachable(&self) -> DashboardResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DashboardError::Network("connection refused".into()));
        }
        Ok(())
    }

    fn writable(&self) -> DashboardResult<()> {
        self.reachable()?;
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(DashboardError::Network("backend unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl HrBackend for FakeBackend {
    async fn list_employees(&self) -> DashboardResult<Vec<Employee>> {
        self.reachable()?;
        self.employee_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.employees.lock().unwrap().clone())
    }

    async fn list_departments(&self) -> DashboardResult<Vec<Department>> {
        self.reachable()?;
        Ok(vec![Department {
            id: 1,
            name: "Engineering".into(),
            description: None,
            manager_name: None,
            employee_count: Some(self.employees.lock().unwrap().len() as u32),
        }])
    }

    async fn month_snapshot(&self, month: MonthKey) -> DashboardResult<MonthSnapshot> {
        self.reachable()?;
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        // lets concurrent loads interleave
        YieldOnce(false).await;

        let employees = self.employees.lock().unwrap().clone();
        let attendance = self.attendance.lock().unwrap();
        let attendance_data = attendance
            .iter()
            .map(|(id, days)| {
                let in_month = days
                    .iter()
                    .filter(|(d, _)| month.contains(**d))
                    .map(|(d, s)| (d.format("%Y-%m-%d").to_string(), s.to_string()))
                    .collect();
                (id.to_string(), in_month)
            })
            .collect();

        Ok(MonthSnapshot {
            employees,
            attendance_data,
        })
    }

    async fn mark_attendance(&self, record: &AttendanceRecord) -> DashboardResult<()> {
        self.writable()?;
        self.seed_mark(record.employee_id, record.date, record.status);
        Ok(())
    }

    async fn unmark_attendance(&self, employee_id: u64, date: NaiveDate) -> DashboardResult<()> {
        self.writable()?;
        let removed = self
            .attendance
            .lock()
            .unwrap()
            .get_mut(&employee_id)
            .and_then(|days| days.remove(&date));
        match removed {
            Some(_) => Ok(()),
            None => Err(DashboardError::NotFound("Attendance record not found".into())),
        }
    }

    async fn clear_month(&self, month: MonthKey) -> DashboardResult<()> {
        self.writable()?;
        for days in self.attendance.lock().unwrap().values_mut() {
            days.retain(|d, _| !month.contains(*d));
        }
        Ok(())
    }

    async fn clear_date(&self, date: NaiveDate) -> DashboardResult<()> {
        self.writable()?;
        for days in self.attendance.lock().unwrap().values_mut() {
            days.remove(&date);
        }
        Ok(())
    }

    async fn list_holidays(&self) -> DashboardResult<Vec<Holiday>> {
        self.reachable()?;
        Ok(self.holidays.lock().unwrap().clone())
    }

    async fn add_holiday(&self, holiday: &NewHoliday) -> DashboardResult<Holiday> {
        YieldOnce(false).await;
        self.writable()?;
        let mut holidays = self.holidays.lock().unwrap();
        if let Some(existing) = holidays.iter().find(|h| h.date == holiday.date) {
            return Err(DashboardError::Validation(format!(
                "A holiday \"{}\" already exists on {}",
                existing.name, holiday.date
            )));
        }
        let created = Holiday {
            id: HolidayId::Remote(self.next_holiday_id.fetch_add(1, Ordering::SeqCst)),
            name: holiday.name.clone(),
            date: holiday.date,
            description: holiday.description.clone(),
        };
        holidays.push(created.clone());
        Ok(created)
    }

    async fn delete_holiday(&self, id: HolidayId) -> DashboardResult<()> {
        self.writable()?;
        let mut holidays = self.holidays.lock().unwrap();
        let before = holidays.len();
        holidays.retain(|h| h.id != id);
        if holidays.len() == before {
            return Err(DashboardError::NotFound(format!("holiday {} not found", id)));
        }
        Ok(())
    }

    async fn validate_month(&self, _month: MonthKey) -> DashboardResult<ServerValidation> {
        self.reachable()?;
        Ok(ServerValidation {
            is_complete: false,
            total_expected: 0,
            total_marked: 0,
            missing_count: 0,
            completion_percentage: 100.0,
            working_days_count: 0,
            employees_count: 0,
        })
    }

    async fn export_month(
        &self,
        month: MonthKey,
        format: ExportFormat,
        force_full_month: bool,
    ) -> DashboardResult<ExportFile> {
        self.reachable()?;
        self.exports
            .lock()
            .unwrap()
            .push((month, format, force_full_month));
        Ok(ExportFile {
            file_name: format.file_name(month),
            content_type: format.content_type(),
            body: Bytes::from_static(b"report"),
        })
    }

    async fn list_leaves(&self) -> DashboardResult<Vec<LeaveRequest>> {
        self.reachable()?;
        Ok(self.leaves.lock().unwrap().clone())
    }

    async fn decide_leave(&self, leave_id: u64, action: LeaveAction) -> DashboardResult<()> {
        self.writable()?;
        let mut leaves = self.leaves.lock().unwrap();
        let leave = leaves
            .iter_mut()
            .find(|l| l.id == leave_id)
            .ok_or_else(|| DashboardError::NotFound("Leave not found".into()))?;
        leave.status = match action {
            LeaveAction::Approve => "approved".into(),
            LeaveAction::Reject => "rejected".into(),
        };
        Ok(())
    }
}
