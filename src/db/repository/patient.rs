use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::sqlite::{decode_timestamp, encode_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, name, patient_id, birth_date, email, phone, profile_picture,
     department, doctor_name, created_at, updated_at";

/// Insert a new patient. The external `patient_id` must be unused.
pub fn insert_patient(conn: &Connection, new: &NewPatient) -> Result<Patient, DatabaseError> {
    if patient_code_exists(conn, &new.patient_id)? {
        return Err(DatabaseError::AlreadyExists {
            entity_type: "Patient".into(),
            id: new.patient_id.clone(),
        });
    }

    let now = encode_timestamp(&Utc::now());
    conn.execute(
        "INSERT INTO patients (name, patient_id, birth_date, email, phone, profile_picture,
         department, doctor_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            new.name,
            new.patient_id,
            new.birth_date,
            new.email,
            new.phone,
            new.profile_picture,
            new.department,
            new.doctor_name,
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_patient(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Patient".into(),
        id: id.to_string(),
    })
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], patient_row_from_rusqlite)
        .optional()?;
    row.map(patient_from_row).transpose()
}

/// Look a patient up by the external identifier (e.g. `P-2024-001`).
pub fn get_patient_by_code(
    conn: &Connection,
    patient_code: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?1");
    let row = conn
        .query_row(&sql, params![patient_code], patient_row_from_rusqlite)
        .optional()?;
    row.map(patient_from_row).transpose()
}

/// Patients, most recently registered first, optionally capped at `limit`.
pub fn list_patients(
    conn: &Connection,
    limit: Option<usize>,
) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC, id DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![sql_limit(limit)], patient_row_from_rusqlite)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

/// The earliest-registered patient, if any.
pub fn first_patient(conn: &Connection) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id LIMIT 1");
    let row = conn
        .query_row(&sql, [], patient_row_from_rusqlite)
        .optional()?;
    row.map(patient_from_row).transpose()
}

/// Apply a partial update to the patient identified by `patient_code`.
/// Changing the external identifier to one held by another patient fails.
pub fn update_patient(
    conn: &Connection,
    patient_code: &str,
    update: &PatientUpdate,
) -> Result<Patient, DatabaseError> {
    let mut patient = get_patient_by_code(conn, patient_code)?.ok_or_else(|| {
        DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: patient_code.to_string(),
        }
    })?;

    if let Some(new_code) = &update.patient_id {
        if new_code != &patient.patient_id && patient_code_exists(conn, new_code)? {
            return Err(DatabaseError::AlreadyExists {
                entity_type: "Patient".into(),
                id: new_code.clone(),
            });
        }
    }

    update.apply_to(&mut patient);
    patient.updated_at = Utc::now();

    conn.execute(
        "UPDATE patients SET name = ?1, patient_id = ?2, birth_date = ?3, email = ?4,
         phone = ?5, profile_picture = ?6, department = ?7, doctor_name = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            patient.name,
            patient.patient_id,
            patient.birth_date,
            patient.email,
            patient.phone,
            patient.profile_picture,
            patient.department,
            patient.doctor_name,
            encode_timestamp(&patient.updated_at),
            patient.id,
        ],
    )?;
    Ok(patient)
}

/// Delete a patient by external identifier. Lab tests and reports go with it.
pub fn delete_patient(conn: &Connection, patient_code: &str) -> Result<(), DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM patients WHERE patient_id = ?1",
        params![patient_code],
    )?;
    if removed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: patient_code.to_string(),
        });
    }
    Ok(())
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

/// SQLite treats a negative LIMIT as unbounded.
pub(crate) fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX))
}

fn patient_code_exists(conn: &Connection, patient_code: &str) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE patient_id = ?1)",
        params![patient_code],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// Internal row type for Patient mapping
pub(crate) struct PatientRow {
    id: i64,
    name: String,
    patient_id: String,
    birth_date: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    profile_picture: Option<String>,
    department: Option<String>,
    doctor_name: Option<String>,
    created_at: String,
    updated_at: String,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    patient_row_at(row, 0)
}

/// Read the patient columns starting at `offset`, for joins that select
/// `PATIENT_COLUMNS` after their own columns.
pub(crate) fn patient_row_at(
    row: &rusqlite::Row<'_>,
    offset: usize,
) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        patient_id: row.get(offset + 2)?,
        birth_date: row.get(offset + 3)?,
        email: row.get(offset + 4)?,
        phone: row.get(offset + 5)?,
        profile_picture: row.get(offset + 6)?,
        department: row.get(offset + 7)?,
        doctor_name: row.get(offset + 8)?,
        created_at: row.get(offset + 9)?,
        updated_at: row.get(offset + 10)?,
    })
}

pub(crate) fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: row.id,
        name: row.name,
        patient_id: row.patient_id,
        birth_date: row.birth_date,
        email: row.email,
        phone: row.phone,
        profile_picture: row.profile_picture,
        department: row.department,
        doctor_name: row.doctor_name,
        created_at: decode_timestamp(&row.created_at)?,
        updated_at: decode_timestamp(&row.updated_at)?,
    })
}
