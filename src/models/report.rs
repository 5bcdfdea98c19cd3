use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored outcome of one liver panel analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalReport {
    pub id: i64,
    /// Row id of the patient the report belongs to.
    pub patient_id: i64,
    pub diagnosis: String,
    pub confidence: f64,
    pub advice: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicalReport {
    pub patient_id: i64,
    pub diagnosis: String,
    pub confidence: f64,
    pub advice: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportUpdate {
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub advice: Option<String>,
    #[serde(default)]
    pub patient_id: Option<i64>,
}

/// A report joined with the details of its patient, if the patient row
/// still exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportWithPatient {
    pub report: MedicalReport,
    pub patient: Option<super::Patient>,
}
