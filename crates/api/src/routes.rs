//! HTTP routes for the booking surface

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use careslot_domain::{Appointment, Slot};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthenticatedPatient;
use crate::context::AppContext;
use crate::error::ApiError;

/// Slot exposed to patients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDto {
    pub id: String,
    pub summary: String,
    pub start: i64,
    pub end: i64,
    pub is_all_day: bool,
}

impl From<&Slot> for SlotDto {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id.clone(),
            summary: slot.summary.clone(),
            start: slot.start.epoch_seconds(),
            end: slot.end.epoch_seconds(),
            is_all_day: slot.start.is_all_day(),
        }
    }
}

/// Booking request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub slot_id: String,
}

/// Appointment exposed to patients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDto {
    pub id: i64,
    pub slot_id: Option<String>,
    pub start: i64,
    pub end: i64,
    pub status: String,
}

impl From<&Appointment> for AppointmentDto {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id,
            slot_id: appointment.slot_ref.clone(),
            start: appointment.start_ts,
            end: appointment.end_ts,
            status: appointment.status.to_string(),
        }
    }
}

/// Cancellation confirmation (the mutated rows are not returned)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub slot_id: String,
    pub cancelled: bool,
}

/// Health probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// Build the application router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/slots", get(list_slots))
        .route("/api/appointments", get(my_appointments).post(book_appointment))
        .route("/api/appointments/{slot_id}", delete(cancel_appointment))
        .with_state(ctx)
}

async fn list_slots(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedPatient(patient_ref): AuthenticatedPatient,
) -> Result<Json<Vec<SlotDto>>, ApiError> {
    info!(command = "slots::list", patient_ref = %patient_ref, "listing open slots");

    let slots = ctx.booking.list_available().await?;

    Ok(Json(slots.iter().map(SlotDto::from).collect()))
}

async fn book_appointment(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedPatient(patient_ref): AuthenticatedPatient,
    Json(request): Json<BookRequest>,
) -> Result<(StatusCode, Json<AppointmentDto>), ApiError> {
    info!(
        command = "appointments::book",
        patient_ref = %patient_ref,
        slot_id = %request.slot_id,
        "booking slot"
    );

    let appointment = ctx.booking.book(&request.slot_id, &patient_ref).await?;

    Ok((StatusCode::CREATED, Json(AppointmentDto::from(&appointment))))
}

async fn cancel_appointment(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedPatient(patient_ref): AuthenticatedPatient,
    Path(slot_id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    info!(
        command = "appointments::cancel",
        patient_ref = %patient_ref,
        slot_id = %slot_id,
        "cancelling booking"
    );

    ctx.booking.cancel(&slot_id, &patient_ref).await?;

    Ok(Json(CancelResponse { slot_id, cancelled: true }))
}

async fn my_appointments(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedPatient(patient_ref): AuthenticatedPatient,
) -> Result<Json<Vec<AppointmentDto>>, ApiError> {
    info!(command = "appointments::list_mine", patient_ref = %patient_ref, "listing bookings");

    let appointments = ctx.booking.list_mine(&patient_ref).await?;

    Ok(Json(appointments.iter().map(AppointmentDto::from).collect()))
}

async fn health(State(ctx): State<Arc<AppContext>>) -> Result<Json<HealthResponse>, ApiError> {
    let database = match ctx.db.health_check() {
        Ok(()) => "ok".to_string(),
        Err(err) => return Err(ApiError(err)),
    };

    Ok(Json(HealthResponse { status: "ok".to_string(), database }))
}
