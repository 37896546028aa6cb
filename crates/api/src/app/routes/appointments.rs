use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Extension, Query},
    response::Response,
    routing::{get, post, put},
    Router,
};
use serde_json::json;

use totes_auth::PermissionId;
use totes_core::Entity;
use totes_crm::{Appointment, ensure_slot_available, hourly_counts, parse_date, parse_date_time};

use crate::app::AppState;
use crate::app::errors::{ApiError, ServiceResultExt};
use crate::app::pipeline::{Operation, PathParam, execute, json_body, path_id};
use crate::context::RequestContext;

use super::crud;
use super::resources::Appointments;

pub fn router() -> Router {
    crud::routes::<Appointments>()
        .collection(post(create_appointment))
        .member(put(update_appointment))
        .route("/customer/:customer_id", get(by_customer))
        .route("/by-customer-and-date", get(by_customer_and_date))
        .route("/hourly-count", get(hourly_count))
        .build()
}

fn query_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, ApiError> {
    match params.get(name).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("query parameter '{name}' is required"))),
    }
}

pub async fn create_appointment(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded("create appointment", PermissionId::CreateAppointment).created();
    execute(app, &ctx, op, || json_body::<Appointment>(&body), |appointment| async move {
        // Stored rendering of the date-time, so the lookup matches exactly.
        let slot = appointment.field("date_time").unwrap_or_default();
        let booked = app.services.appointments.find_where("date_time", &slot).await.for_entity("appointment")?;
        ensure_slot_available(booked.len())?;
        app.services.appointments.create(appointment).await.for_entity("appointment")
    })
    .await
}

/// Moving an appointment counts the target slot without the appointment itself.
pub async fn update_appointment(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("update appointment {raw}"), PermissionId::UpdateAppointment);
    let bind = || -> Result<_, ApiError> { Ok((raw.id()?, json_body::<Appointment>(&body)?)) };
    execute(app, &ctx, op, bind, |(id, appointment)| async move {
        app.services.appointments.get(id).await.for_entity("appointment")?;
        let slot = appointment.field("date_time").unwrap_or_default();
        let booked = app.services.appointments.find_where("date_time", &slot).await.for_entity("appointment")?;
        ensure_slot_available(booked.iter().filter(|other| other.id() != id).count())?;
        app.services.appointments.update(id, appointment).await.for_entity("appointment")
    })
    .await
}

pub async fn by_customer(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("list appointments of customer {raw}"), PermissionId::GetAppointmentByCustomerId);
    execute(app, &ctx, op, || raw.id(), |customer_id| async move {
        app.services
            .appointments
            .find_where("customer_id", &customer_id.to_string())
            .await
            .for_entity("appointment")
    })
    .await
}

pub async fn by_customer_and_date(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let app = &app;
    let op = Operation::guarded(
        "get appointment by customer and date",
        PermissionId::GetAppointmentsByCustomerIdAndDate,
    );
    let bind = || -> Result<_, ApiError> {
        let customer_id = path_id(query_param(&params, "customer_id")?)?;
        let date_time = parse_date_time(query_param(&params, "date_time")?)?;
        Ok((customer_id, date_time))
    };
    execute(app, &ctx, op, bind, |(customer_id, date_time)| async move {
        app.services
            .appointments
            .find_where("customer_id", &customer_id.to_string())
            .await
            .for_entity("appointment")?
            .into_iter()
            .find(|a| a.date_time == date_time)
            .ok_or_else(|| ApiError::not_found("appointment"))
    })
    .await
}

/// `{date, appointments_per_hour: [{hour, count}]}` for `?date=YYYY-MM-DD`.
pub async fn hourly_count(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let app = &app;
    let op = Operation::guarded("count appointments per hour", PermissionId::GetAppointmentsByHour);
    let bind = || -> Result<_, ApiError> { Ok(parse_date(query_param(&params, "date")?)?) };
    execute(app, &ctx, op, bind, |date| async move {
        let all = app.services.appointments.list().await.for_entity("appointment")?;
        Ok(json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "appointments_per_hour": hourly_counts(date, &all),
        }))
    })
    .await
}
