use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::client::HrBackend;
use crate::error::{DashboardError, DashboardResult};
use crate::model::holiday::{Holiday, HolidayId, NewHoliday};
use crate::model::month::MonthKey;
use crate::state::grid::AttendanceGrid;
use crate::state::holiday_store::HolidayStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HolidaySource {
    Backend,
    LocalStore,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HolidayAdded {
    pub holiday: Holiday,
    /// Attendance marks removed locally from the new holiday's date.
    pub cleared_marks: usize,
    /// False when the backend still holds marks on that date.
    pub marks_cleared_on_backend: bool,
    pub stored_locally: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct MigrationStatus {
    pub degraded: bool,
    pub pending_local: usize,
    pub needs_migration: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MigrationReport {
    pub migrated: usize,
    /// Local entries dropped because the backend already has that date.
    pub skipped: usize,
    pub remaining: usize,
}

#[derive(Default)]
struct RegistryState {
    by_date: BTreeMap<NaiveDate, Holiday>,
    degraded: bool,
}

impl RegistryState {
    fn snapshot(&self) -> Vec<Holiday> {
        self.by_date.values().cloned().collect()
    }

    fn local_entries(&self) -> Vec<Holiday> {
        self.by_date
            .values()
            .filter(|h| h.id.is_local())
            .cloned()
            .collect()
    }
}

/// Dates on which nobody is expected to work.
///
/// Backed by the HR backend; falls back to a local JSON store while the
/// backend is unreachable. Entries created in that mode keep a local id
/// until `migrate_to_backend` posts them.
pub struct HolidayRegistry {
    backend: Arc<dyn HrBackend>,
    store: HolidayStore,
    state: RwLock<RegistryState>,
}

impl HolidayRegistry {
    pub fn new(backend: Arc<dyn HrBackend>, store: HolidayStore) -> Self {
        Self {
            backend,
            store,
            state: RwLock::new(RegistryState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self) {
        let snapshot = self.read().snapshot();
        if let Err(e) = self.store.save(&snapshot) {
            error!(error = %e, "Could not save local holiday store");
        }
    }

    pub async fn refresh(&self) -> DashboardResult<HolidaySource> {
        match self.backend.list_holidays().await {
            Ok(remote) => {
                {
                    let mut state = self.write();
                    let pending = state.local_entries();
                    state.by_date = remote.into_iter().map(|h| (h.date, h)).collect();
                    for holiday in pending {
                        state.by_date.entry(holiday.date).or_insert(holiday);
                    }
                    state.degraded = false;
                }
                self.persist();
                Ok(HolidaySource::Backend)
            }
            Err(DashboardError::Network(reason)) => {
                warn!(%reason, "Holiday backend unreachable, serving local store");
                let stored = self.store.load();
                let mut state = self.write();
                state.degraded = true;
                match stored {
                    Ok(holidays) => {
                        state.by_date = holidays.into_iter().map(|h| (h.date, h)).collect();
                    }
                    Err(e) => error!(error = %e, "Local holiday store unusable, keeping current set"),
                }
                Ok(HolidaySource::LocalStore)
            }
            Err(e) => Err(e),
        }
    }

    /// Registers a holiday and clears every mark on its date.
    pub async fn add(
        &self,
        new: NewHoliday,
        grid: &AttendanceGrid,
    ) -> DashboardResult<HolidayAdded> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(DashboardError::validation("Holiday name must not be empty"));
        }
        let new = NewHoliday { name, ..new };

        let degraded = {
            let state = self.read();
            if let Some(existing) = state.by_date.get(&new.date) {
                return Err(DashboardError::validation(format!(
                    "A holiday \"{}\" already exists on {}",
                    existing.name, new.date
                )));
            }
            state.degraded
        };

        let (holiday, stored_locally) = if degraded {
            (new.into_local(), true)
        } else {
            match self.backend.add_holiday(&new).await {
                Ok(created) => (created, false),
                Err(DashboardError::Network(reason)) => {
                    warn!(%reason, date = %new.date, "Holiday backend unreachable, storing locally");
                    self.write().degraded = true;
                    (new.into_local(), true)
                }
                Err(e) => return Err(e),
            }
        };

        {
            let mut state = self.write();
            // another add may have taken the date while the backend answered
            if let Some(existing) = state.by_date.get(&holiday.date) {
                warn!(id = %holiday.id, date = %holiday.date, "Lost a concurrent add on this date");
                return Err(DashboardError::validation(format!(
                    "A holiday \"{}\" already exists on {}",
                    existing.name, holiday.date
                )));
            }
            state.by_date.insert(holiday.date, holiday.clone());
        }
        self.persist();
        info!(id = %holiday.id, date = %holiday.date, stored_locally, "Holiday added");

        let marked_before = grid.marks_on(holiday.date);
        let (cleared_marks, marks_cleared_on_backend) =
            match grid.clear_dates_across_employees(holiday.date).await {
                Ok(n) => (n, true),
                Err(e) => {
                    let cleared = marked_before.saturating_sub(grid.marks_on(holiday.date));
                    warn!(error = %e, date = %holiday.date, cleared, "Backend kept marks on the new holiday");
                    (cleared, false)
                }
            };

        Ok(HolidayAdded {
            holiday,
            cleared_marks,
            marks_cleared_on_backend,
            stored_locally,
        })
    }

    /// Deletes a holiday. Attendance cleared when it was added stays cleared.
    pub async fn remove(&self, id: HolidayId) -> DashboardResult<Holiday> {
        let existing = self
            .read()
            .by_date
            .values()
            .find(|h| h.id == id)
            .cloned()
            .ok_or_else(|| DashboardError::NotFound(format!("holiday {} not found", id)))?;

        if !id.is_local() {
            self.backend.delete_holiday(id).await?;
        }

        self.write().by_date.retain(|_, h| h.id != id);
        self.persist();
        info!(%id, date = %existing.date, "Holiday removed");
        Ok(existing)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.read().by_date.contains_key(&date)
    }

    pub fn name_for(&self, date: NaiveDate) -> Option<String> {
        self.read().by_date.get(&date).map(|h| h.name.clone())
    }

    pub fn list(&self) -> Vec<Holiday> {
        self.read().snapshot()
    }

    pub fn in_month(&self, month: MonthKey) -> Vec<Holiday> {
        self.read()
            .by_date
            .range(month.first_day()..=month.last_day())
            .map(|(_, h)| h.clone())
            .collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.read().degraded
    }

    pub fn migration_status(&self) -> MigrationStatus {
        let state = self.read();
        let pending_local = state.by_date.values().filter(|h| h.id.is_local()).count();
        MigrationStatus {
            degraded: state.degraded,
            pending_local,
            needs_migration: pending_local > 0,
        }
    }

    /// Posts every locally created holiday to the backend.
    ///
    /// Dates the backend already knows are dropped locally. Entries that
    /// fail to post keep their local id.
    pub async fn migrate_to_backend(&self) -> DashboardResult<MigrationReport> {
        let remote = self.backend.list_holidays().await?;
        let pending = {
            let mut state = self.write();
            state.degraded = false;
            let pending = state.local_entries();
            state.by_date = remote.into_iter().map(|h| (h.date, h)).collect();
            pending
        };

        let mut report = MigrationReport::default();
        for local in pending {
            if self.read().by_date.contains_key(&local.date) {
                report.skipped += 1;
                continue;
            }
            let new = NewHoliday {
                name: local.name.clone(),
                date: local.date,
                description: local.description.clone(),
            };
            match self.backend.add_holiday(&new).await {
                Ok(created) => {
                    report.migrated += 1;
                    self.write().by_date.insert(created.date, created);
                }
                Err(DashboardError::Validation(reason)) => {
                    info!(%reason, date = %local.date, "Backend already has this holiday");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(error = %e, date = %local.date, "Holiday migration failed, keeping local entry");
                    report.remaining += 1;
                    let mut state = self.write();
                    if e.is_network() {
                        state.degraded = true;
                    }
                    state.by_date.insert(local.date, local);
                }
            }
        }

        self.persist();
        info!(
            migrated = report.migrated,
            skipped = report.skipped,
            remaining = report.remaining,
            "Holiday migration finished"
        );
        Ok(report)
    }
}
