use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::patient::sql_limit;
use crate::db::sqlite::{decode_timestamp, encode_timestamp};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

pub fn insert_lab_test(
    conn: &Connection,
    patient_row_id: i64,
    lab: &NewLabTest,
) -> Result<LabTest, DatabaseError> {
    conn.execute(
        "INSERT INTO lab_tests (patient_id, test_name, value, unit, normal_range, status,
         date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            patient_row_id,
            lab.test_name,
            lab.value,
            lab.unit,
            lab.normal_range,
            lab.status.as_str(),
            encode_timestamp(&lab.date),
            encode_timestamp(&Utc::now()),
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_lab_test(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "LabTest".into(),
        id: id.to_string(),
    })
}

pub fn get_lab_test(conn: &Connection, id: i64) -> Result<Option<LabTest>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_id, test_name, value, unit, normal_range, status, date, created_at
             FROM lab_tests WHERE id = ?1",
            params![id],
            lab_row_from_rusqlite,
        )
        .optional()?;
    row.map(lab_from_row).transpose()
}

/// Lab tests for one patient, most recent `date` first.
pub fn list_lab_tests_for_patient(
    conn: &Connection,
    patient_row_id: i64,
    limit: Option<usize>,
) -> Result<Vec<LabTest>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, test_name, value, unit, normal_range, status, date, created_at
         FROM lab_tests WHERE patient_id = ?1 ORDER BY date DESC, id DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![patient_row_id, sql_limit(limit)], lab_row_from_rusqlite)?;

    let mut labs = Vec::new();
    for row in rows {
        labs.push(lab_from_row(row?)?);
    }
    Ok(labs)
}

pub fn delete_lab_test(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let removed = conn.execute("DELETE FROM lab_tests WHERE id = ?1", params![id])?;
    if removed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "LabTest".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn count_lab_tests(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM lab_tests", [], |row| row.get(0))?;
    Ok(count)
}

// Internal row type for LabTest mapping
struct LabRow {
    id: i64,
    patient_id: i64,
    test_name: String,
    value: f64,
    unit: String,
    normal_range: String,
    status: String,
    date: String,
    created_at: String,
}

fn lab_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<LabRow, rusqlite::Error> {
    Ok(LabRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        test_name: row.get(2)?,
        value: row.get(3)?,
        unit: row.get(4)?,
        normal_range: row.get(5)?,
        status: row.get(6)?,
        date: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn lab_from_row(row: LabRow) -> Result<LabTest, DatabaseError> {
    Ok(LabTest {
        id: row.id,
        patient_id: row.patient_id,
        test_name: row.test_name,
        value: row.value,
        unit: row.unit,
        normal_range: row.normal_range,
        status: LabStatus::from_str(&row.status)?,
        date: decode_timestamp(&row.date)?,
        created_at: decode_timestamp(&row.created_at)?,
    })
}
