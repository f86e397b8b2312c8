use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::auth::jwt::tests::backend_token;
use crate::auth::session::Session;
use crate::client::fake::FakeBackend;
use crate::dashboard::Dashboard;
use crate::state::holiday_store::HolidayStore;
use crate::state::holidays::HolidayRegistry;

/// Fresh directory under the system temp dir, unique per call.
pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hrm-dashboard-{}-{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Registry over `backend` with its store in a fresh temp dir.
pub fn registry_for(backend: Arc<FakeBackend>, prefix: &str) -> HolidayRegistry {
    HolidayRegistry::new(
        backend,
        HolidayStore::new(temp_dir(prefix).join("holidays.json")),
    )
}

/// Dashboard over `backend` with a live session installed.
pub fn dashboard_over(backend: Arc<FakeBackend>) -> Dashboard {
    let session = Arc::new(Session::in_memory());
    session.establish(backend_token(900)).unwrap();
    Dashboard::new(
        session,
        backend,
        HolidayStore::new(temp_dir("dashboard").join("holidays.json")),
        false,
        Duration::from_secs(60),
    )
}
