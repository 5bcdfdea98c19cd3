//! `POST /api/analyze`: classify a liver panel and optionally file a report.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::diagnosis::{DiagnosisResult, Gender, LabPanel};
use crate::models::NewMedicalReport;

const REQUIRED: [&str; 4] = ["ALT", "AST", "Bilirubin", "GGT"];

/// Multipart field carrying the lab mapping as a JSON string.
const LAB_VALUES_FIELD: &str = "lab_values";

/// Lab mapping submitted to `/api/analyze`.
///
/// Accepts either a JSON object body or `multipart/form-data` whose
/// `lab_values` field holds the same object as a JSON string.
#[derive(Debug)]
pub struct LabSubmission(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for LabSubmission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            return lab_values_from_multipart(multipart).await.map(Self);
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(no_data());
        }
        parse_lab_mapping(&bytes).map(Self)
    }
}

fn no_data() -> ApiError {
    ApiError::BadRequest("No data provided".into())
}

async fn lab_values_from_multipart(
    mut multipart: Multipart,
) -> Result<Map<String, Value>, ApiError> {
    let mut saw_file = false;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(LAB_VALUES_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                if text.trim().is_empty() {
                    return Err(no_data());
                }
                return parse_lab_mapping(text.as_bytes());
            }
            Some("file") => saw_file = true,
            _ => {}
        }
    }

    if saw_file {
        return Err(ApiError::BadRequest(
            "Image analysis is not supported; send lab_values".into(),
        ));
    }
    Err(no_data())
}

fn parse_lab_mapping(raw: &[u8]) -> Result<Map<String, Value>, ApiError> {
    serde_json::from_slice(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid lab values: {e}")))
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: AnalysisView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisView {
    pub diagnosis: String,
    pub confidence: u8,
    pub advice: String,
    pub lab_values: LabValuesView,
    pub timestamp: String,
    #[serde(rename = "report_id", skip_serializing_if = "Option::is_none")]
    pub report_id: Option<i64>,
    #[serde(rename = "report_saved")]
    pub report_saved: bool,
}

#[derive(Debug, Serialize)]
pub struct LabValuesView {
    #[serde(rename = "ALT")]
    pub alt: f64,
    #[serde(rename = "AST")]
    pub ast: f64,
    #[serde(rename = "Bilirubin")]
    pub bilirubin: f64,
    #[serde(rename = "GGT")]
    pub ggt: f64,
}

/// `POST /api/analyze`
pub async fn analyze(
    State(ctx): State<ApiContext>,
    LabSubmission(body): LabSubmission,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let panel = panel_from_body(&body)?;
    let result = ctx.core.predictor().predict(&panel);
    tracing::info!(
        diagnosis = %result.diagnosis,
        confidence = result.confidence,
        "Analysis complete"
    );

    let report_id = match patient_reference(&body)? {
        Some(patient) => save_report(&ctx, &patient, &result),
        None => None,
    };

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis: AnalysisView {
            diagnosis: result.diagnosis,
            confidence: result.confidence,
            advice: result.advice,
            lab_values: LabValuesView {
                alt: panel.alt,
                ast: panel.ast,
                bilirubin: panel.bilirubin,
                ggt: panel.ggt,
            },
            timestamp: Utc::now().to_rfc3339(),
            report_id,
            report_saved: report_id.is_some(),
        },
    }))
}

/// Build a panel from the request mapping. The four primary markers are
/// required; the rest fall back to the panel defaults.
pub fn panel_from_body(body: &Map<String, Value>) -> Result<LabPanel, ApiError> {
    let mut primary = [0.0; 4];
    for (slot, key) in primary.iter_mut().zip(REQUIRED) {
        *slot = lab_value(body, key)?
            .ok_or_else(|| ApiError::BadRequest(format!("Missing required lab value: {key}")))?;
    }
    let [alt, ast, bilirubin, ggt] = primary;

    let mut panel = LabPanel::new(alt, ast, bilirubin, ggt);
    if let Some(age) = lab_value(body, "Age")? {
        panel = panel.with_age(age);
    }
    if let Some(alk_phos) = lab_value(body, "AlkPhos")? {
        panel = panel.with_alk_phos(alk_phos);
    }
    if let Some(tp) = lab_value(body, "TP")? {
        panel = panel.with_total_protein(tp);
    }
    if let Some(alb) = lab_value(body, "ALB")? {
        panel = panel.with_albumin(alb);
    }
    match body.get("Gender") {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => {
            let gender: Gender = s.parse().map_err(ApiError::BadRequest)?;
            panel = panel.with_gender(gender);
        }
        Some(other) => {
            return Err(ApiError::BadRequest(format!("Invalid value for Gender: {other}")));
        }
    }
    Ok(panel)
}

/// A lab value given as a JSON number or a numeric string. `null` and
/// absent keys read as `None`.
fn lab_value(body: &Map<String, Value>, key: &str) -> Result<Option<f64>, ApiError> {
    let invalid = |raw: &dyn std::fmt::Display| {
        ApiError::BadRequest(format!("Invalid value for {key}: {raw}"))
    };

    let value = match body.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(n))?,
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid(s))?,
        Some(other) => return Err(invalid(other)),
    };

    if !value.is_finite() || value < 0.0 {
        return Err(invalid(&value));
    }
    Ok(Some(value))
}

fn patient_reference(body: &Map<String, Value>) -> Result<Option<String>, ApiError> {
    match body.get("patient_id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(ApiError::BadRequest(format!(
            "Invalid value for patient_id: {other}"
        ))),
    }
}

/// Persist the result against the referenced patient. Failures are logged
/// and reported as `None`; they never fail the analysis.
fn save_report(ctx: &ApiContext, patient_ref: &str, result: &DiagnosisResult) -> Option<i64> {
    match try_save_report(ctx, patient_ref, result) {
        Ok(Some(id)) => {
            tracing::debug!(report_id = id, patient = patient_ref, "Medical report saved");
            Some(id)
        }
        Ok(None) => {
            tracing::warn!(patient = patient_ref, "Report not saved: unknown patient");
            None
        }
        Err(e) => {
            tracing::warn!(patient = patient_ref, error = %e, "Report not saved");
            None
        }
    }
}

/// A numeric reference is tried as a row id first, then as an external
/// identifier.
fn try_save_report(
    ctx: &ApiContext,
    patient_ref: &str,
    result: &DiagnosisResult,
) -> Result<Option<i64>, ApiError> {
    let conn = ctx.core.open_db()?;
    let by_row = match patient_ref.parse::<i64>() {
        Ok(row_id) => db::get_patient(&conn, row_id)?,
        Err(_) => None,
    };
    let patient = match by_row {
        Some(p) => Some(p),
        None => db::get_patient_by_code(&conn, patient_ref)?,
    };
    let Some(patient) = patient else {
        return Ok(None);
    };

    let report = db::insert_report(
        &conn,
        &NewMedicalReport {
            patient_id: patient.id,
            diagnosis: result.diagnosis.clone(),
            confidence: f64::from(result.confidence),
            advice: result.advice.clone(),
        },
    )?;
    Ok(Some(report.id))
}
