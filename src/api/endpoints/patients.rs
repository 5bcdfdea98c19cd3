//! Patient CRUD plus the single-patient dashboard view.
//!
//! Patients are addressed by their external `patient_id` string in paths.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::endpoints::lab_tests::LabTestView;
use crate::api::types::{string_or_number, ApiContext};
use crate::db;
use crate::models::{NewPatient, Patient, PatientUpdate};

/// Lab tests shown on the dashboard.
const DASHBOARD_LAB_LIMIT: usize = 10;

#[derive(Serialize)]
pub struct PatientListResponse {
    pub success: bool,
    pub patients: Vec<Patient>,
}

#[derive(Serialize)]
pub struct PatientResponse {
    pub success: bool,
    pub patient: Patient,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct CreatePatientRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
}

impl CreatePatientRequest {
    fn into_new_patient(self) -> Result<NewPatient, ApiError> {
        let required = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let (Some(patient_id), Some(name)) = (required(self.patient_id), required(self.name)) else {
            return Err(ApiError::BadRequest("Patient ID and name are required".into()));
        };
        Ok(NewPatient {
            name,
            patient_id,
            birth_date: self.birth_date.filter(|s| !s.is_empty()),
            email: self.email,
            phone: self.phone,
            profile_picture: self.profile_picture,
            department: self.department,
            doctor_name: self.doctor_name,
        })
    }
}

/// `GET /api/patients`, newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<PatientListResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let patients = db::list_patients(&conn, None)?;
    Ok(Json(PatientListResponse {
        success: true,
        patients,
    }))
}

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<PatientResponse>, ApiError> {
    let new = request.into_new_patient()?;
    let conn = ctx.core.open_db()?;
    let patient = db::insert_patient(&conn, &new)?;
    tracing::info!(patient_id = %patient.patient_id, "Patient created");
    Ok(Json(PatientResponse {
        success: true,
        patient,
        message: None,
    }))
}

/// `GET /api/patients/:patient_id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let patient = db::get_patient_by_code(&conn, &patient_id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;
    Ok(Json(PatientResponse {
        success: true,
        patient,
        message: None,
    }))
}

/// `PUT /api/patients/:patient_id`: only supplied fields change.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
    Json(update): Json<PatientUpdate>,
) -> Result<Json<PatientResponse>, ApiError> {
    let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
    if blank(&update.name) || blank(&update.patient_id) {
        return Err(ApiError::BadRequest("Patient ID and name cannot be empty".into()));
    }

    let conn = ctx.core.open_db()?;
    let patient = db::update_patient(&conn, &patient_id, &update)?;
    tracing::info!(patient_id = %patient.patient_id, "Patient updated");
    Ok(Json(PatientResponse {
        success: true,
        patient,
        message: Some("Patient updated successfully"),
    }))
}

/// `DELETE /api/patients/:patient_id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    db::delete_patient(&conn, &patient_id)?;
    tracing::info!(patient_id = %patient_id, "Patient deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "Patient deleted successfully",
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDataResponse {
    pub success: bool,
    pub patient: DashboardPatient,
    pub lab_tests: Vec<LabTestView>,
}

#[derive(Serialize)]
pub struct DashboardPatient {
    /// External identifier.
    pub id: String,
    pub name: String,
    pub birth_date: Option<String>,
    pub department: Option<String>,
    pub doctor_name: Option<String>,
}

/// `GET /api/patient-data`: the first registered patient and their most
/// recent lab tests.
pub async fn dashboard(
    State(ctx): State<ApiContext>,
) -> Result<Json<PatientDataResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let patient = db::first_patient(&conn)?
        .ok_or_else(|| ApiError::NotFound("No patients registered".into()))?;
    let labs = db::list_lab_tests_for_patient(&conn, patient.id, Some(DASHBOARD_LAB_LIMIT))?;

    Ok(Json(PatientDataResponse {
        success: true,
        patient: DashboardPatient {
            id: patient.patient_id,
            name: patient.name,
            birth_date: patient.birth_date,
            department: patient.department,
            doctor_name: patient.doctor_name,
        },
        lab_tests: labs.iter().map(LabTestView::from).collect(),
    }))
}
