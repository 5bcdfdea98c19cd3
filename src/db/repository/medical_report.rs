use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::patient::{patient_from_row, patient_row_at, sql_limit};
use crate::db::sqlite::{decode_timestamp, encode_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_report(
    conn: &Connection,
    report: &NewMedicalReport,
) -> Result<MedicalReport, DatabaseError> {
    insert_report_at(conn, report, Utc::now())
}

/// Insert a report with an explicit creation time (used by the demo seed).
pub fn insert_report_at(
    conn: &Connection,
    report: &NewMedicalReport,
    created_at: DateTime<Utc>,
) -> Result<MedicalReport, DatabaseError> {
    conn.execute(
        "INSERT INTO medical_reports (patient_id, diagnosis, confidence, advice, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            report.patient_id,
            report.diagnosis,
            report.confidence,
            report.advice,
            encode_timestamp(&created_at),
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_report(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "MedicalReport".into(),
        id: id.to_string(),
    })
}

pub fn get_report(conn: &Connection, id: i64) -> Result<Option<MedicalReport>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_id, diagnosis, confidence, advice, created_at
             FROM medical_reports WHERE id = ?1",
            params![id],
            report_row_from_rusqlite,
        )
        .optional()?;
    row.map(report_from_row).transpose()
}

/// Reports, newest first, each with its patient's details.
pub fn list_reports_with_patients(
    conn: &Connection,
    limit: Option<usize>,
) -> Result<Vec<ReportWithPatient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.patient_id, r.diagnosis, r.confidence, r.advice, r.created_at,
                p.id, p.name, p.patient_id, p.birth_date, p.email, p.phone, p.profile_picture,
                p.department, p.doctor_name, p.created_at, p.updated_at
         FROM medical_reports r
         LEFT JOIN patients p ON p.id = r.patient_id
         ORDER BY r.created_at DESC, r.id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![sql_limit(limit)], |row| {
        let report = report_row_from_rusqlite(row)?;
        let patient_id: Option<i64> = row.get(6)?;
        let patient = match patient_id {
            Some(_) => Some(patient_row_at(row, 6)?),
            None => None,
        };
        Ok((report, patient))
    })?;

    let mut joined = Vec::new();
    for row in rows {
        let (report, patient) = row?;
        joined.push(ReportWithPatient {
            report: report_from_row(report)?,
            patient: patient.map(patient_from_row).transpose()?,
        });
    }
    Ok(joined)
}

/// Apply a partial update. Reassigning to a patient row that does not exist
/// is a constraint violation.
pub fn update_report(
    conn: &Connection,
    id: i64,
    update: &ReportUpdate,
) -> Result<MedicalReport, DatabaseError> {
    let mut report = get_report(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "MedicalReport".into(),
        id: id.to_string(),
    })?;

    if let Some(patient_row_id) = update.patient_id {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)",
            params![patient_row_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DatabaseError::ConstraintViolation(format!(
                "Patient {patient_row_id} does not exist"
            )));
        }
        report.patient_id = patient_row_id;
    }
    if let Some(diagnosis) = &update.diagnosis {
        report.diagnosis = diagnosis.clone();
    }
    if let Some(confidence) = update.confidence {
        if !(0.0..=100.0).contains(&confidence) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "confidence {confidence} outside 0-100"
            )));
        }
        report.confidence = confidence;
    }
    if let Some(advice) = &update.advice {
        report.advice = advice.clone();
    }

    conn.execute(
        "UPDATE medical_reports SET patient_id = ?1, diagnosis = ?2, confidence = ?3, advice = ?4
         WHERE id = ?5",
        params![
            report.patient_id,
            report.diagnosis,
            report.confidence,
            report.advice,
            report.id,
        ],
    )?;
    Ok(report)
}

pub fn delete_report(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let removed = conn.execute("DELETE FROM medical_reports WHERE id = ?1", params![id])?;
    if removed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "MedicalReport".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn count_reports(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM medical_reports", [], |row| row.get(0))?;
    Ok(count)
}

// Internal row type for MedicalReport mapping
struct ReportRow {
    id: i64,
    patient_id: i64,
    diagnosis: String,
    confidence: f64,
    advice: String,
    created_at: String,
}

fn report_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ReportRow, rusqlite::Error> {
    Ok(ReportRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        diagnosis: row.get(2)?,
        confidence: row.get(3)?,
        advice: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn report_from_row(row: ReportRow) -> Result<MedicalReport, DatabaseError> {
    Ok(MedicalReport {
        id: row.id,
        patient_id: row.patient_id,
        diagnosis: row.diagnosis,
        confidence: row.confidence,
        advice: row.advice,
        created_at: decode_timestamp(&row.created_at)?,
    })
}
