use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::LabStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTest {
    pub id: i64,
    /// Row id of the owning patient.
    pub patient_id: i64,
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub normal_range: String,
    pub status: LabStatus,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLabTest {
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub normal_range: String,
    pub status: LabStatus,
    pub date: DateTime<Utc>,
}
