use crate::{
    api::{attendance, employee, holiday, leave_request, session},
    auth::middleware::session_middleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str) {
    cfg.service(
        web::scope(api_prefix)
            // open: installing or dropping the token
            .service(
                web::resource("/session")
                    .route(web::get().to(session::session_status))
                    .route(web::post().to(session::install_token))
                    .route(web::delete().to(session::logout)),
            )
            // everything else needs a live session
            .service(
                web::scope("")
                    .wrap(from_fn(session_middleware))
                    .service(
                        web::scope("/employees")
                            .service(web::resource("").route(web::get().to(employee::list_employees)))
                            .service(
                                web::resource("/refresh")
                                    .route(web::post().to(employee::refresh_employees)),
                            )
                            .service(web::resource("/{id}").route(web::get().to(employee::get_employee))),
                    )
                    .service(
                        web::resource("/departments").route(web::get().to(employee::list_departments)),
                    )
                    .service(
                        web::scope("/attendance")
                            // /attendance
                            .service(web::resource("").route(web::post().to(attendance::mark)))
                            .service(
                                web::resource("/overview").route(web::get().to(attendance::overview)),
                            )
                            .service(
                                web::resource("/validate").route(web::get().to(attendance::validate)),
                            )
                            .service(
                                web::resource("/validate/server")
                                    .route(web::get().to(attendance::validate_on_server)),
                            )
                            .service(web::resource("/export").route(web::get().to(attendance::export)))
                            .service(
                                web::resource("/stats/{employee_id}")
                                    .route(web::get().to(attendance::stats)),
                            )
                            .service(
                                web::resource("/month/{month}")
                                    .route(web::delete().to(attendance::clear_month)),
                            )
                            // /attendance/{employee_id}/{date}
                            .service(
                                web::resource("/{employee_id}/{date}")
                                    .route(web::delete().to(attendance::unmark)),
                            ),
                    )
                    .service(
                        web::scope("/holidays")
                            .service(
                                web::resource("")
                                    .route(web::get().to(holiday::list_holidays))
                                    .route(web::post().to(holiday::add_holiday)),
                            )
                            .service(
                                web::resource("/refresh")
                                    .route(web::post().to(holiday::refresh_holidays)),
                            )
                            .service(
                                web::resource("/migration")
                                    .route(web::get().to(holiday::migration_status))
                                    .route(web::post().to(holiday::migrate_holidays)),
                            )
                            .service(
                                web::resource("/{id}").route(web::delete().to(holiday::delete_holiday)),
                            ),
                    )
                    .service(
                        web::scope("/leaves")
                            .service(web::resource("").route(web::get().to(leave_request::leave_list)))
                            // /leaves/{id}/approve
                            .service(
                                web::resource("/{id}/approve")
                                    .route(web::put().to(leave_request::decide_leave)),
                            ),
                    ),
            ),
    );
}
