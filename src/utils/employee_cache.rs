use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info};

use crate::client::HrBackend;
use crate::error::{DashboardError, DashboardResult};
use crate::model::employee::{Employee, EmployeeFilter};

/// Read-through cache of the backend's employee list.
///
/// The whole roster is one cache entry; concurrent misses share a single
/// backend call.
pub struct EmployeeDirectory {
    backend: Arc<dyn HrBackend>,
    cache: Cache<(), Arc<Vec<Employee>>>,
}

impl EmployeeDirectory {
    pub fn new(backend: Arc<dyn HrBackend>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(ttl)
            .build();
        Self { backend, cache }
    }

    pub async fn all(&self) -> DashboardResult<Arc<Vec<Employee>>> {
        let backend = self.backend.clone();
        self.cache
            .try_get_with((), async move {
                debug!("Employee directory miss, fetching from backend");
                backend.list_employees().await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<DashboardError>| (*e).clone())
    }

    pub async fn get(&self, employee_id: u64) -> DashboardResult<Employee> {
        self.all()
            .await?
            .iter()
            .find(|e| e.id == employee_id)
            .cloned()
            .ok_or_else(|| DashboardError::NotFound(format!("Employee {} not found", employee_id)))
    }

    pub async fn filtered(&self, filter: &EmployeeFilter) -> DashboardResult<Vec<Employee>> {
        let all = self.all().await?;
        Ok(filter.apply(&all).into_iter().cloned().collect())
    }

    /// Replaces the cached list with a roster obtained elsewhere, such as a
    /// month snapshot.
    pub async fn seed(&self, employees: Vec<Employee>) {
        self.cache.insert((), Arc::new(employees)).await;
    }

    pub async fn refresh(&self) -> DashboardResult<Arc<Vec<Employee>>> {
        self.cache.invalidate(&()).await;
        let employees = self.all().await?;
        info!(count = employees.len(), "Employee directory refreshed");
        Ok(employees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeBackend;
    use std::sync::atomic::Ordering;

    fn directory(backend: &Arc<FakeBackend>) -> EmployeeDirectory {
        EmployeeDirectory::new(backend.clone(), Duration::from_secs(60))
    }

    #[actix_web::test]
    async fn list_is_fetched_once_until_refresh() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe", "Jane Smith"]));
        let directory = directory(&backend);

        assert_eq!(directory.all().await.unwrap().len(), 2);
        assert_eq!(directory.get(2).await.unwrap().name, "Jane Smith");
        assert_eq!(backend.employee_calls.load(Ordering::SeqCst), 1);

        directory.refresh().await.unwrap();
        assert_eq!(backend.employee_calls.load(Ordering::SeqCst), 2);
    }

    #[actix_web::test]
    async fn failures_are_not_cached() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe"]));
        let directory = directory(&backend);

        backend.go_offline();
        assert!(directory.all().await.unwrap_err().is_network());
        backend.go_online();
        assert_eq!(directory.all().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn filter_and_unknown_ids() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe", "Jane Smith"]));
        let directory = directory(&backend);
        let filter = EmployeeFilter {
            search: Some("JANE".into()),
            department: None,
        };

        let found = directory.filtered(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(matches!(
            directory.get(9).await.unwrap_err(),
            DashboardError::NotFound(_)
        ));
    }

    #[actix_web::test]
    async fn seeded_roster_skips_the_backend() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe"]));
        let directory = directory(&backend);

        directory
            .seed(vec![crate::client::fake::employee(7, "Seeded")])
            .await;

        assert_eq!(directory.get(7).await.unwrap().name, "Seeded");
        assert_eq!(backend.employee_calls.load(Ordering::SeqCst), 0);
    }
}
