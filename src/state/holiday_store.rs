use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DashboardError, DashboardResult};
use crate::model::holiday::Holiday;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    holidays: Vec<Holiday>,
}

/// Durable copy of the holiday registry, used while the backend is down.
///
/// Holds the last known backend entries plus anything created locally and
/// not yet migrated. Writes go to a sibling temp file first and are renamed
/// into place.
pub struct HolidayStore {
    path: PathBuf,
}

impl HolidayStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> DashboardResult<Vec<Holiday>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_error("read", e)),
        };

        let snapshot: StoreSnapshot = serde_json::from_slice(&raw)
            .map_err(|e| DashboardError::Storage(format!("corrupt holiday store: {}", e)))?;
        debug!(
            count = snapshot.holidays.len(),
            saved_at = %snapshot.saved_at,
            "Loaded local holiday store"
        );
        Ok(snapshot.holidays)
    }

    pub fn save(&self, holidays: &[Holiday]) -> DashboardResult<()> {
        let snapshot = StoreSnapshot {
            version: STORE_VERSION,
            saved_at: Utc::now(),
            holidays: holidays.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| DashboardError::Storage(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_error("create directory", e))?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| storage_error("write", e))?;
        fs::rename(&tmp, &self.path).map_err(|e| storage_error("replace", e))
    }
}

fn storage_error(action: &str, e: std::io::Error) -> DashboardError {
    DashboardError::Storage(format!("could not {} holiday store: {}", action, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::holiday::HolidayId;
    use crate::test_support::temp_dir;
    use chrono::NaiveDate;

    #[test]
    fn missing_file_is_an_empty_store() {
        let store = HolidayStore::new(temp_dir("store-missing").join("holidays.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn saved_entries_load_back() {
        let store = HolidayStore::new(temp_dir("store-save").join("nested/holidays.json"));
        let holidays = vec![
            Holiday {
                id: HolidayId::Remote(3),
                name: "New Year Day".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                description: None,
            },
            Holiday {
                id: HolidayId::new_local(),
                name: "Company Day".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                description: Some("offsite".into()),
            },
        ];

        store.save(&holidays).unwrap();
        assert_eq!(store.load().unwrap(), holidays);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let path = temp_dir("store-corrupt").join("holidays.json");
        fs::write(&path, b"{not json").unwrap();
        let err = HolidayStore::new(path).load().unwrap_err();
        assert!(matches!(err, DashboardError::Storage(_)));
    }
}
