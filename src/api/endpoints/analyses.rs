//! Stored analysis reports joined with patient details.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::endpoints::patients::MessageResponse;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{MedicalReport, ReportUpdate, ReportWithPatient};

const UNKNOWN_PATIENT: &str = "Unknown";

/// One listing entry. Patient fields are flattened next to the report; a
/// report whose patient row is gone reads as "Unknown".
#[derive(Serialize)]
pub struct AnalysisView {
    pub id: i64,
    /// Row id of the patient.
    pub patient_id: i64,
    pub diagnosis: String,
    pub confidence: f64,
    pub advice: String,
    pub created_at: String,
    /// Last update of the patient record.
    pub updated_at: Option<String>,
    pub patient_name: String,
    pub patient_id_display: String,
    pub birth_date: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    pub department: Option<String>,
    pub doctor_name: Option<String>,
}

impl From<&ReportWithPatient> for AnalysisView {
    fn from(row: &ReportWithPatient) -> Self {
        let r = &row.report;
        let p = row.patient.as_ref();
        Self {
            id: r.id,
            patient_id: r.patient_id,
            diagnosis: r.diagnosis.clone(),
            confidence: r.confidence,
            advice: r.advice.clone(),
            created_at: r.created_at.to_rfc3339(),
            updated_at: p.map(|p| p.updated_at.to_rfc3339()),
            patient_name: p.map_or_else(|| UNKNOWN_PATIENT.to_string(), |p| p.name.clone()),
            patient_id_display: p
                .map_or_else(|| UNKNOWN_PATIENT.to_string(), |p| p.patient_id.clone()),
            birth_date: p.and_then(|p| p.birth_date.clone()),
            email: p.and_then(|p| p.email.clone()),
            phone: p.and_then(|p| p.phone.clone()),
            profile_picture: p.and_then(|p| p.profile_picture.clone()),
            department: p.and_then(|p| p.department.clone()),
            doctor_name: p.and_then(|p| p.doctor_name.clone()),
        }
    }
}

#[derive(Serialize)]
pub struct AnalysesResponse {
    pub success: bool,
    pub analyses: Vec<AnalysisView>,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: MedicalReport,
}

/// `GET /api/patient-analyses`, newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<AnalysesResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let rows = db::list_reports_with_patients(&conn, None)?;
    Ok(Json(AnalysesResponse {
        success: true,
        analyses: rows.iter().map(AnalysisView::from).collect(),
    }))
}

/// `PUT /api/patient-analyses/:analysis_id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(analysis_id): Path<String>,
    Json(update): Json<ReportUpdate>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let id = parse_id(&analysis_id)?;
    let conn = ctx.core.open_db()?;
    let analysis = db::update_report(&conn, id, &update)?;
    tracing::info!(analysis_id = id, "Analysis updated");
    Ok(Json(AnalysisResponse {
        success: true,
        analysis,
    }))
}

/// `DELETE /api/patient-analyses/:analysis_id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(analysis_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&analysis_id)?;
    let conn = ctx.core.open_db()?;
    db::delete_report(&conn, id)?;
    tracing::info!(analysis_id = id, "Analysis deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "Analysis deleted successfully",
    }))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid ID format".into()))
}
