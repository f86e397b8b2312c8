use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::dashboard::Dashboard;

#[derive(Deserialize, ToSchema)]
pub struct InstallToken {
    /// Access token issued by the HR backend
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}

/// Install the backend token for this dashboard
#[utoipa::path(
    post,
    path = "/api/session",
    request_body(content = InstallToken, content_type = "application/json"),
    responses(
        (status = 200, description = "Session established", body = Object, example = json!({
            "message": "Session established"
        })),
        (status = 400, description = "Empty token"),
        (status = 401, description = "Token already expired", body = Object, example = json!({
            "error": "authentication required: token already expired",
            "redirect": "/login"
        }))
    ),
    tag = "Session"
)]
pub async fn install_token(
    dashboard: web::Data<Dashboard>,
    payload: web::Json<InstallToken>,
) -> actix_web::Result<impl Responder> {
    dashboard.session.establish(payload.into_inner().token)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Session established" })))
}

/// Whether a session token is installed
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Session state", body = Object, example = json!({ "active": true }))
    ),
    tag = "Session"
)]
pub async fn session_status(dashboard: web::Data<Dashboard>) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(json!({ "active": dashboard.session.is_active() })))
}

/// Log out: drop the token and its persisted copy
#[utoipa::path(
    delete,
    path = "/api/session",
    responses(
        (status = 200, description = "Logged out", body = Object, example = json!({
            "message": "Logged out",
            "redirect": "/login"
        }))
    ),
    tag = "Session"
)]
pub async fn logout(dashboard: web::Data<Dashboard>) -> actix_web::Result<impl Responder> {
    dashboard.session.teardown();

    Ok(HttpResponse::Ok().json(json!({
        "message": "Logged out",
        "redirect": "/login"
    })))
}
