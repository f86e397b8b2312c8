use actix_web::middleware::Next;
use actix_web::{
    Error, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

use crate::dashboard::Dashboard;

/// Turns requests away with a login redirect while no usable session exists.
///
/// Expired tokens are torn down here instead of on the first backend call.
pub async fn session_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let dashboard = req
        .app_data::<Data<Dashboard>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Dashboard state missing"))?;

    if let Err(e) = dashboard.session.bearer() {
        debug!(path = %req.path(), error = %e, "Request without a usable session");
        let resp = e.error_response();
        return Ok(req.into_response(resp));
    }

    next.call(req).await
}
