use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use futures::future::{AbortHandle, Abortable};
use tracing::{debug, info, warn};

use crate::client::{HrBackend, MonthSnapshot};
use crate::error::{DashboardError, DashboardResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStats, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::month::MonthKey;
use crate::state::calendar::is_weekend;
use crate::state::holidays::HolidayRegistry;

/// employee id -> (date -> status)
pub type AttendanceMap = HashMap<u64, BTreeMap<NaiveDate, AttendanceStatus>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { employees: usize, marks: usize },
    /// A load for the same month was already running.
    AlreadyLoading,
    /// Navigation moved to another month before the snapshot arrived.
    Superseded,
}

#[derive(Default)]
struct GridState {
    displayed: Option<MonthKey>,
    /// Month whose snapshot was merged last.
    loaded: Option<MonthKey>,
    roster: Vec<Employee>,
    marks: AttendanceMap,
    in_flight: HashMap<MonthKey, (u64, AbortHandle)>,
    load_seq: u64,
}

impl GridState {
    fn ensure_displayed(&self, date: NaiveDate) -> DashboardResult<()> {
        match self.displayed {
            Some(month) if month.contains(date) => Ok(()),
            Some(month) => Err(DashboardError::validation(format!(
                "{} is outside the displayed month {}",
                date, month
            ))),
            None => Err(DashboardError::validation("No month is displayed")),
        }
    }

    fn put(
        &mut self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Option<AttendanceStatus> {
        self.marks.entry(employee_id).or_default().insert(date, status)
    }

    fn take(&mut self, employee_id: u64, date: NaiveDate) -> Option<AttendanceStatus> {
        self.marks
            .get_mut(&employee_id)
            .and_then(|days| days.remove(&date))
    }

    fn get(&self, employee_id: u64, date: NaiveDate) -> Option<AttendanceStatus> {
        self.marks
            .get(&employee_id)
            .and_then(|days| days.get(&date).copied())
    }

    /// Removes every mark matching `pred`, returning what was removed.
    fn drain_where<F>(&mut self, pred: F) -> Vec<AttendanceRecord>
    where
        F: Fn(NaiveDate) -> bool,
    {
        let mut removed = Vec::new();
        for (employee_id, days) in self.marks.iter_mut() {
            days.retain(|date, status| {
                if pred(*date) {
                    removed.push(AttendanceRecord {
                        employee_id: *employee_id,
                        date: *date,
                        status: *status,
                    });
                    false
                } else {
                    true
                }
            });
        }
        removed
    }

    /// Puts removed marks back where nothing newer has been written since.
    fn restore(&mut self, records: Vec<AttendanceRecord>) {
        for record in records {
            let days = self.marks.entry(record.employee_id).or_default();
            days.entry(record.date).or_insert(record.status);
        }
    }
}

/// Registration of a running month load. Dropping it frees the month for the
/// next load, also when the caller abandons the future midway.
struct InFlight<'a> {
    state: &'a RwLock<GridState>,
    month: MonthKey,
    seq: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(state.in_flight.get(&self.month), Some((s, _)) if *s == self.seq) {
            state.in_flight.remove(&self.month);
        }
    }
}

/// Session view of who is marked what, on which date.
///
/// Edits land in memory first and are persisted afterwards. A failed
/// persistence call keeps the local edit unless `rollback_on_failure` is set.
pub struct AttendanceGrid {
    backend: Arc<dyn HrBackend>,
    rollback_on_failure: bool,
    state: RwLock<GridState>,
}

impl AttendanceGrid {
    pub fn new(backend: Arc<dyn HrBackend>, rollback_on_failure: bool) -> Self {
        Self {
            backend,
            rollback_on_failure,
            state: RwLock::new(GridState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, GridState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GridState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn displayed_month(&self) -> Option<MonthKey> {
        self.read().displayed
    }

    /// True once `month` is displayed and its snapshot has been merged.
    pub fn is_loaded(&self, month: MonthKey) -> bool {
        let state = self.read();
        state.displayed == Some(month) && state.loaded == Some(month)
    }

    pub fn roster(&self) -> Vec<Employee> {
        self.read().roster.clone()
    }

    /// Displays `month` and merges its snapshot once it arrives.
    ///
    /// Loads of other months still running are aborted; a second load of a
    /// month already in flight is dropped.
    pub async fn load_month(&self, month: MonthKey) -> DashboardResult<LoadOutcome> {
        let (handle, registration) = AbortHandle::new_pair();
        let seq = {
            let mut state = self.write();
            state.displayed = Some(month);
            state.in_flight.retain(|m, (_, h)| {
                if *m == month {
                    true
                } else {
                    h.abort();
                    false
                }
            });
            if state.in_flight.contains_key(&month) {
                debug!(%month, "Month load already in flight, dropping");
                return Ok(LoadOutcome::AlreadyLoading);
            }
            state.load_seq += 1;
            let seq = state.load_seq;
            state.in_flight.insert(month, (seq, handle));
            seq
        };

        let in_flight = InFlight {
            state: &self.state,
            month,
            seq,
        };
        let result = Abortable::new(self.backend.month_snapshot(month), registration).await;
        drop(in_flight);

        let mut state = self.write();

        let snapshot = match result {
            Err(_aborted) => {
                debug!(%month, "Month load aborted by navigation");
                return Ok(LoadOutcome::Superseded);
            }
            Ok(Err(e)) => {
                warn!(error = %e, %month, "Month load failed, keeping previous state");
                return Err(e);
            }
            Ok(Ok(snapshot)) => snapshot,
        };

        if state.displayed != Some(month) {
            debug!(%month, "Discarding snapshot for a month no longer displayed");
            return Ok(LoadOutcome::Superseded);
        }

        let (employees, marks) = merge_snapshot(&mut state, month, snapshot);
        info!(%month, employees, marks, "Month snapshot merged");
        Ok(LoadOutcome::Loaded { employees, marks })
    }

    /// Returns the status the cell held before.
    pub async fn mark_cell(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
        holidays: &HolidayRegistry,
    ) -> DashboardResult<Option<AttendanceStatus>> {
        if is_weekend(date) {
            return Err(DashboardError::validation(format!(
                "{} is a weekend",
                date
            )));
        }
        if let Some(name) = holidays.name_for(date) {
            return Err(DashboardError::validation(format!(
                "{} is a holiday ({})",
                date, name
            )));
        }

        let previous = {
            let mut state = self.write();
            state.ensure_displayed(date)?;
            if !state.roster.iter().any(|e| e.id == employee_id) {
                return Err(DashboardError::validation(format!(
                    "Employee {} is not on the displayed roster",
                    employee_id
                )));
            }
            state.put(employee_id, date, status)
        };

        let record = AttendanceRecord {
            employee_id,
            date,
            status,
        };
        if let Err(e) = self.backend.mark_attendance(&record).await {
            warn!(error = %e, employee_id, %date, "Persisting mark failed");
            if self.rollback_on_failure {
                let mut state = self.write();
                if state.get(employee_id, date) == Some(status) {
                    match previous {
                        Some(prev) => state.put(employee_id, date, prev),
                        None => state.take(employee_id, date),
                    };
                }
            }
            return Err(e);
        }

        Ok(previous)
    }

    /// Returns the status that was removed, `None` when the cell was empty.
    pub async fn unmark_cell(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> DashboardResult<Option<AttendanceStatus>> {
        let removed = {
            let mut state = self.write();
            state.ensure_displayed(date)?;
            state.take(employee_id, date)
        };
        let Some(removed) = removed else {
            return Ok(None);
        };

        match self.backend.unmark_attendance(employee_id, date).await {
            // already gone on the backend
            Ok(()) | Err(DashboardError::NotFound(_)) => Ok(Some(removed)),
            Err(e) => {
                warn!(error = %e, employee_id, %date, "Persisting unmark failed");
                if self.rollback_on_failure {
                    self.write().restore(vec![AttendanceRecord {
                        employee_id,
                        date,
                        status: removed,
                    }]);
                }
                Err(e)
            }
        }
    }

    /// Removes every mark of `month` for every employee. Returns how many
    /// local marks were removed.
    pub async fn clear_month(&self, month: MonthKey) -> DashboardResult<usize> {
        let removed = self.write().drain_where(|d| month.contains(d));
        let count = removed.len();

        if let Err(e) = self.backend.clear_month(month).await {
            warn!(error = %e, %month, "Persisting month clear failed");
            if self.rollback_on_failure {
                self.write().restore(removed);
            }
            return Err(e);
        }

        info!(%month, count, "Month cleared");
        Ok(count)
    }

    /// Removes the marks of one date across all employees. Used when that
    /// date becomes a holiday.
    pub async fn clear_dates_across_employees(&self, date: NaiveDate) -> DashboardResult<usize> {
        let removed = self.write().drain_where(|d| d == date);
        let count = removed.len();

        if let Err(e) = self.backend.clear_date(date).await {
            warn!(error = %e, %date, "Persisting date clear failed");
            if self.rollback_on_failure {
                self.write().restore(removed);
            }
            return Err(e);
        }

        debug!(%date, count, "Date cleared across employees");
        Ok(count)
    }

    /// Marks held locally on `date`, across employees.
    pub fn marks_on(&self, date: NaiveDate) -> usize {
        self.read()
            .marks
            .values()
            .filter(|days| days.contains_key(&date))
            .count()
    }

    pub fn status_of(&self, employee_id: u64, date: NaiveDate) -> Option<AttendanceStatus> {
        self.read().get(employee_id, date)
    }

    pub fn stats_for(&self, employee_id: u64, month: MonthKey) -> AttendanceStats {
        let state = self.read();
        let mut stats = AttendanceStats::default();
        let Some(days) = state.marks.get(&employee_id) else {
            return stats;
        };
        for date in month.days() {
            if let Some(status) = days.get(&date) {
                stats.record(*status);
            }
        }
        stats
    }

    /// Marks falling inside `month`, per employee.
    pub fn entries_for(&self, month: MonthKey) -> AttendanceMap {
        self.read()
            .marks
            .iter()
            .map(|(id, days)| {
                let in_month = days
                    .range(month.first_day()..=month.last_day())
                    .map(|(d, s)| (*d, *s))
                    .collect::<BTreeMap<_, _>>();
                (*id, in_month)
            })
            .filter(|(_, days)| !days.is_empty())
            .collect()
    }
}

/// Replaces the month's marks of every employee the snapshot mentions.
fn merge_snapshot(state: &mut GridState, month: MonthKey, snapshot: MonthSnapshot) -> (usize, usize) {
    let mut incoming: AttendanceMap = HashMap::new();
    for (raw_id, days) in snapshot.attendance_data {
        let Ok(employee_id) = raw_id.parse::<u64>() else {
            warn!(employee = %raw_id, "Skipping snapshot row with a bad employee id");
            continue;
        };
        let row = incoming.entry(employee_id).or_default();
        for (raw_date, raw_status) in days {
            let date = match NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d") {
                Ok(d) if month.contains(d) => d,
                _ => {
                    warn!(employee_id, date = %raw_date, "Skipping snapshot cell with a bad date");
                    continue;
                }
            };
            match AttendanceStatus::from_str(&raw_status) {
                Ok(status) => {
                    row.insert(date, status);
                }
                Err(_) => {
                    warn!(employee_id, %date, status = %raw_status, "Skipping unknown status")
                }
            }
        }
    }

    let mut touched: Vec<u64> = snapshot.employees.iter().map(|e| e.id).collect();
    touched.extend(incoming.keys().copied());

    for employee_id in touched {
        let days = state.marks.entry(employee_id).or_default();
        days.retain(|d, _| !month.contains(*d));
        if let Some(row) = incoming.get(&employee_id) {
            days.extend(row.iter().map(|(d, s)| (*d, *s)));
        }
    }

    let employees = snapshot.employees.len();
    let marks = incoming.values().map(BTreeMap::len).sum();
    state.roster = snapshot.employees;
    state.loaded = Some(month);
    (employees, marks)
}
