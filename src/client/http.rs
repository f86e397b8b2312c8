use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::auth::session::Session;
use crate::client::{ExportFile, ExportFormat, HrBackend, MonthSnapshot, ServerValidation};
use crate::error::{DashboardError, DashboardResult};
use crate::model::attendance::AttendanceRecord;
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::holiday::{Holiday, HolidayId, NewHoliday};
use crate::model::leave_request::{LeaveAction, LeaveRequest};
use crate::model::month::MonthKey;

/// Error body shape the backend uses for every failure.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    error: Option<String>,
}

/// `HrBackend` over REST with the session's bearer token.
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        session: Arc<Session>,
        timeout: Duration,
    ) -> DashboardResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn build_request(&self, method: Method, endpoint: &str) -> DashboardResult<RequestBuilder> {
        let token = self.session.bearer()?;
        let url = format!("{}{}", self.base_url, endpoint);

        Ok(self
            .http_client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json"))
    }

    /// Sends and maps every non-success status into the error taxonomy.
    async fn send(&self, request: RequestBuilder, context_msg: &str) -> DashboardResult<Response> {
        let response = request.send().await.map_err(|e| {
            error!(error = %e, context = context_msg, "Backend request failed");
            DashboardError::Network(e.to_string())
        })?;

        let status = response.status();
        debug!(context = context_msg, %status, "Backend responded");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorPayload>(&body)
            .ok()
            .and_then(|p| p.message.or(p.error))
            .unwrap_or_else(|| format!("{} ({})", context_msg, status));

        match status {
            // flask-jwt answers 422 for malformed tokens
            StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
                warn!(context = context_msg, %status, "Backend rejected the session token");
                self.session.teardown();
                Err(DashboardError::Auth(message))
            }
            StatusCode::NOT_FOUND => Err(DashboardError::NotFound(message)),
            s if s.is_client_error() => Err(DashboardError::Validation(message)),
            _ => {
                error!(context = context_msg, %status, body = %body, "Backend error");
                Err(DashboardError::Network(message))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        context_msg: &str,
    ) -> DashboardResult<T> {
        let request = self.build_request(Method::GET, endpoint)?;
        let response = self.send(request, context_msg).await?;
        let bytes = response.bytes().await?;

        serde_json::from_slice(&bytes).map_err(|e| {
            error!(error = %e, context = context_msg, "Could not decode backend body");
            DashboardError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl HrBackend for HttpBackend {
    async fn list_employees(&self) -> DashboardResult<Vec<Employee>> {
        self.get_json("/employees", "list employees").await
    }

    async fn list_departments(&self) -> DashboardResult<Vec<Department>> {
        self.get_json("/departments", "list departments").await
    }

    async fn month_snapshot(&self, month: MonthKey) -> DashboardResult<MonthSnapshot> {
        let endpoint = format!("/attendance/overview?date={}", month.query_date());
        self.get_json(&endpoint, "month snapshot").await
    }

    async fn mark_attendance(&self, record: &AttendanceRecord) -> DashboardResult<()> {
        let request = self
            .build_request(Method::POST, "/attendance")?
            .json(&json!({
                "employee_id": record.employee_id,
                "date": record.date.format("%Y-%m-%d").to_string(),
                "status": record.status,
            }));
        self.send(request, "mark attendance").await?;
        Ok(())
    }

    async fn unmark_attendance(&self, employee_id: u64, date: NaiveDate) -> DashboardResult<()> {
        let endpoint = format!("/attendance/{}/{}", employee_id, date.format("%Y-%m-%d"));
        let request = self.build_request(Method::DELETE, &endpoint)?;
        self.send(request, "unmark attendance").await?;
        Ok(())
    }

    async fn clear_month(&self, month: MonthKey) -> DashboardResult<()> {
        let endpoint = format!("/attendance/month/{}", month.query_date());
        let request = self.build_request(Method::DELETE, &endpoint)?;
        self.send(request, "clear month").await?;
        Ok(())
    }

    async fn clear_date(&self, date: NaiveDate) -> DashboardResult<()> {
        let endpoint = format!("/attendance/date/{}", date.format("%Y-%m-%d"));
        let request = self.build_request(Method::DELETE, &endpoint)?;
        self.send(request, "clear date").await?;
        Ok(())
    }

    async fn list_holidays(&self) -> DashboardResult<Vec<Holiday>> {
        self.get_json("/holidays", "list holidays").await
    }

    async fn add_holiday(&self, holiday: &NewHoliday) -> DashboardResult<Holiday> {
        let request = self.build_request(Method::POST, "/holidays")?.json(holiday);
        let response = self.send(request, "add holiday").await?;
        Ok(response.json().await?)
    }

    async fn delete_holiday(&self, id: HolidayId) -> DashboardResult<()> {
        let HolidayId::Remote(id) = id else {
            return Err(DashboardError::NotFound(format!(
                "holiday {} exists only locally",
                id
            )));
        };
        let request = self.build_request(Method::DELETE, &format!("/holidays/{}", id))?;
        self.send(request, "delete holiday").await?;
        Ok(())
    }

    async fn validate_month(&self, month: MonthKey) -> DashboardResult<ServerValidation> {
        let endpoint = format!("/attendance/validate?date={}", month.query_date());
        self.get_json(&endpoint, "validate month").await
    }

    async fn export_month(
        &self,
        month: MonthKey,
        format: ExportFormat,
        force_full_month: bool,
    ) -> DashboardResult<ExportFile> {
        let request = self
            .build_request(Method::GET, format.path())?
            .query(&[
                ("date", month.query_date()),
                ("force_full_month", force_full_month.to_string()),
            ]);
        let response = self.send(request, "export month").await?;

        Ok(ExportFile {
            file_name: format.file_name(month),
            content_type: format.content_type(),
            body: response.bytes().await?,
        })
    }

    async fn list_leaves(&self) -> DashboardResult<Vec<LeaveRequest>> {
        self.get_json("/leaves", "list leaves").await
    }

    async fn decide_leave(&self, leave_id: u64, action: LeaveAction) -> DashboardResult<()> {
        let endpoint = format!("/leaves/{}/approve", leave_id);
        let request = self
            .build_request(Method::PUT, &endpoint)?
            .json(&json!({ "action": action }));
        self.send(request, "decide leave").await?;
        Ok(())
    }
}
