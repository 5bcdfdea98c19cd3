use chrono::{Duration, Utc};
use rusqlite::Connection;

use super::repository::*;
use super::DatabaseError;
use crate::models::enums::LabStatus;
use crate::models::*;

const DEPARTMENTS: [&str; 7] = [
    "Hepatology",
    "Gastroenterology",
    "Internal Medicine",
    "Emergency",
    "Cardiology",
    "Neurology",
    "Radiology",
];

const DOCTORS: [&str; 7] = [
    "Dr. Sarah Ahmed",
    "Dr. Michael Chen",
    "Dr. Emily Johnson",
    "Dr. David Wilson",
    "Dr. Lisa Brown",
    "Dr. James Davis",
    "Dr. Maria Garcia",
];

/// (name, external id, age in years)
const PATIENTS: [(&str, &str, i64); 5] = [
    ("John Smith", "P-2024-001", 45),
    ("Sarah Johnson", "P-2024-002", 32),
    ("Michael Brown", "P-2024-003", 58),
    ("Emily Davis", "P-2024-004", 29),
    ("Robert Wilson", "P-2024-005", 67),
];

struct SeedLab {
    patient: usize,
    test_name: &'static str,
    value: f64,
    unit: &'static str,
    normal_range: &'static str,
    status: LabStatus,
    days_ago: i64,
}

const fn seed_lab(
    patient: usize,
    test_name: &'static str,
    value: f64,
    unit: &'static str,
    normal_range: &'static str,
    status: LabStatus,
    days_ago: i64,
) -> SeedLab {
    SeedLab { patient, test_name, value, unit, normal_range, status, days_ago }
}

const LAB_TESTS: [SeedLab; 14] = [
    seed_lab(0, "ALT", 35.0, "U/L", "7-56", LabStatus::Normal, 7),
    seed_lab(0, "AST", 25.0, "U/L", "10-40", LabStatus::Normal, 7),
    seed_lab(0, "Bilirubin", 0.8, "mg/dL", "0.3-1.2", LabStatus::Normal, 7),
    seed_lab(0, "GGT", 28.0, "U/L", "9-48", LabStatus::Normal, 7),
    seed_lab(0, "Blood Glucose", 95.0, "mg/dL", "70-100", LabStatus::Normal, 14),
    seed_lab(0, "Cholesterol", 185.0, "mg/dL", "< 200", LabStatus::Normal, 14),
    seed_lab(1, "ALT", 85.0, "U/L", "7-56", LabStatus::High, 3),
    seed_lab(1, "AST", 65.0, "U/L", "10-40", LabStatus::High, 3),
    seed_lab(1, "Bilirubin", 1.8, "mg/dL", "0.3-1.2", LabStatus::High, 3),
    seed_lab(1, "GGT", 75.0, "U/L", "9-48", LabStatus::High, 3),
    seed_lab(2, "ALT", 45.0, "U/L", "7-56", LabStatus::Normal, 1),
    seed_lab(2, "AST", 120.0, "U/L", "10-40", LabStatus::High, 1),
    seed_lab(2, "Bilirubin", 2.5, "mg/dL", "0.3-1.2", LabStatus::High, 1),
    seed_lab(2, "Albumin", 2.8, "g/dL", "3.5-5.0", LabStatus::Low, 1),
];

/// (patient index, diagnosis, confidence, advice, days ago)
const REPORTS: [(usize, &str, f64, &str, i64); 3] = [
    (
        0,
        "Normal Liver Function",
        95.0,
        "All liver function tests are within normal ranges. Continue routine monitoring and healthy lifestyle.",
        7,
    ),
    (
        1,
        "Hepatitis C (Stage 2)",
        88.0,
        "Elevated liver enzymes suggest possible hepatitis C. Further diagnostic testing including viral load and liver biopsy recommended.",
        3,
    ),
    (
        2,
        "Liver Cirrhosis (Stage 3)",
        85.0,
        "Signs of advanced liver disease with cirrhosis. Immediate specialist consultation required. Screen for hepatocellular carcinoma and varices.",
        1,
    ),
];

/// Populate an empty database with demo patients, lab tests and reports.
///
/// Returns `false` without writing anything when patients already exist.
/// Everything is written in a single transaction.
pub fn seed_demo_data(conn: &Connection) -> Result<bool, DatabaseError> {
    let existing = count_patients(conn)?;
    if existing > 0 {
        tracing::info!(existing, "Database already has patients, skipping demo seed");
        return Ok(false);
    }

    let tx = conn.unchecked_transaction()?;
    let now = Utc::now();

    let mut patient_ids = Vec::with_capacity(PATIENTS.len());
    for (i, (name, code, age)) in PATIENTS.iter().enumerate() {
        let birth_date = (now - Duration::days(age * 365)).format("%Y-%m-%d").to_string();
        let patient = insert_patient(
            &tx,
            &NewPatient {
                name: (*name).into(),
                patient_id: (*code).into(),
                birth_date: Some(birth_date),
                department: Some(DEPARTMENTS[i % DEPARTMENTS.len()].into()),
                doctor_name: Some(DOCTORS[i % DOCTORS.len()].into()),
                ..Default::default()
            },
        )?;
        patient_ids.push(patient.id);
    }

    for lab in &LAB_TESTS {
        insert_lab_test(
            &tx,
            patient_ids[lab.patient],
            &NewLabTest {
                test_name: lab.test_name.into(),
                value: lab.value,
                unit: lab.unit.into(),
                normal_range: lab.normal_range.into(),
                status: lab.status,
                date: now - Duration::days(lab.days_ago),
            },
        )?;
    }

    for (patient, diagnosis, confidence, advice, days_ago) in REPORTS {
        insert_report_at(
            &tx,
            &NewMedicalReport {
                patient_id: patient_ids[patient],
                diagnosis: diagnosis.into(),
                confidence,
                advice: advice.into(),
            },
            now - Duration::days(days_ago),
        )?;
    }

    tx.commit()?;
    tracing::info!(
        patients = PATIENTS.len(),
        lab_tests = LAB_TESTS.len(),
        reports = REPORTS.len(),
        "Seeded demo data"
    );
    Ok(true)
}
