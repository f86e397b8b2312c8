use chrono::Local;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::dashboard::Dashboard;
use crate::model::month::MonthKey;

pub mod attendance;
pub mod employee;
pub mod holiday;
pub mod leave_request;
pub mod session;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthQuery {
    /// `YYYY-MM` or any `YYYY-MM-DD` in the month; defaults to the displayed month
    #[param(value_type = Option<String>, example = "2024-01")]
    pub month: Option<MonthKey>,
}

impl MonthQuery {
    /// Requested month, else the displayed one, else the current one.
    pub fn resolve(&self, dashboard: &Dashboard) -> MonthKey {
        self.month
            .or_else(|| dashboard.grid.displayed_month())
            .unwrap_or_else(|| MonthKey::of(Local::now().date_naive()))
    }
}
