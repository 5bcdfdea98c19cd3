//! Repository layer: entity-scoped database operations.
//!
//! Patients are addressed externally by their string `patient_id`; lab tests
//! and reports reference the patient's integer row id.

mod lab_test;
mod medical_report;
mod patient;

pub use lab_test::*;
pub use medical_report::*;
pub use patient::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;
    use crate::models::enums::*;
    use crate::models::*;
    use chrono::{Duration, Utc};
    use rusqlite::Connection;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_patient(conn: &Connection, code: &str) -> Patient {
        insert_patient(
            conn,
            &NewPatient {
                name: format!("Patient {code}"),
                patient_id: code.into(),
                email: Some(format!("{code}@example.com")),
                department: Some("Hepatology".into()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn lab(name: &str, value: f64, days_ago: i64) -> NewLabTest {
        NewLabTest {
            test_name: name.into(),
            value,
            unit: "U/L".into(),
            normal_range: "7-56".into(),
            status: LabStatus::Normal,
            date: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn patient_insert_and_lookup() {
        let conn = test_db();
        let created = make_patient(&conn, "P-1");
        assert!(created.id > 0);
        assert_eq!(created.created_at, created.updated_at);

        let by_row = get_patient(&conn, created.id).unwrap().unwrap();
        let by_code = get_patient_by_code(&conn, "P-1").unwrap().unwrap();
        assert_eq!(by_row, by_code);
        assert_eq!(by_code.email.as_deref(), Some("P-1@example.com"));
        assert!(get_patient_by_code(&conn, "P-404").unwrap().is_none());
    }

    #[test]
    fn duplicate_patient_code_rejected() {
        let conn = test_db();
        make_patient(&conn, "P-1");
        let err = insert_patient(
            &conn,
            &NewPatient {
                name: "Other".into(),
                patient_id: "P-1".into(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::AlreadyExists { .. }));
        assert_eq!(count_patients(&conn).unwrap(), 1);
    }

    #[test]
    fn list_is_newest_first_and_first_is_oldest() {
        let conn = test_db();
        assert!(first_patient(&conn).unwrap().is_none());
        make_patient(&conn, "P-B");
        make_patient(&conn, "P-A");
        make_patient(&conn, "P-C");
        let codes: Vec<_> = list_patients(&conn, None)
            .unwrap()
            .into_iter()
            .map(|p| p.patient_id)
            .collect();
        assert_eq!(codes, vec!["P-C", "P-A", "P-B"]);
        assert_eq!(list_patients(&conn, Some(1)).unwrap().len(), 1);
        assert_eq!(first_patient(&conn).unwrap().unwrap().patient_id, "P-B");
    }

    #[test]
    fn patient_update_applies_partial_fields() {
        let conn = test_db();
        make_patient(&conn, "P-1");
        let update: PatientUpdate =
            serde_json::from_str(r#"{"name": "Renamed", "email": null, "patient_id": "P-9"}"#)
                .unwrap();
        let updated = update_patient(&conn, "P-1", &update).unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, None);
        assert_eq!(updated.department.as_deref(), Some("Hepatology"));
        assert!(updated.updated_at >= updated.created_at);

        let stored = get_patient_by_code(&conn, "P-9").unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert!(get_patient_by_code(&conn, "P-1").unwrap().is_none());
    }

    #[test]
    fn patient_update_rejects_taken_code_and_missing_patient() {
        let conn = test_db();
        make_patient(&conn, "P-1");
        make_patient(&conn, "P-2");
        let update = PatientUpdate {
            patient_id: Some("P-2".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_patient(&conn, "P-1", &update).unwrap_err(),
            DatabaseError::AlreadyExists { .. }
        ));
        assert!(matches!(
            update_patient(&conn, "P-404", &PatientUpdate::default()).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }

    #[test]
    fn deleting_patient_cascades() {
        let conn = test_db();
        let p = make_patient(&conn, "P-1");
        insert_lab_test(&conn, p.id, &lab("ALT", 40.0, 1)).unwrap();
        insert_report(
            &conn,
            &NewMedicalReport {
                patient_id: p.id,
                diagnosis: "Normal".into(),
                confidence: 95.0,
                advice: "Keep it up.".into(),
            },
        )
        .unwrap();

        delete_patient(&conn, "P-1").unwrap();
        assert_eq!(count_patients(&conn).unwrap(), 0);
        assert_eq!(count_lab_tests(&conn).unwrap(), 0);
        assert_eq!(count_reports(&conn).unwrap(), 0);
        assert!(matches!(
            delete_patient(&conn, "P-1").unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }

    #[test]
    fn lab_tests_listed_newest_first_with_limit() {
        let conn = test_db();
        let p = make_patient(&conn, "P-1");
        let other = make_patient(&conn, "P-2");
        for (i, name) in ["ALT", "AST", "GGT"].iter().enumerate() {
            insert_lab_test(&conn, p.id, &lab(name, 10.0, i as i64 + 1)).unwrap();
        }
        insert_lab_test(&conn, other.id, &lab("ALT", 99.0, 0)).unwrap();

        let all = list_lab_tests_for_patient(&conn, p.id, None).unwrap();
        let names: Vec<_> = all.iter().map(|l| l.test_name.as_str()).collect();
        assert_eq!(names, vec!["ALT", "AST", "GGT"]);

        let limited = list_lab_tests_for_patient(&conn, p.id, Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn lab_test_insert_requires_existing_patient() {
        let conn = test_db();
        let err = insert_lab_test(&conn, 42, &lab("ALT", 1.0, 0)).unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlite(_)));
    }

    #[test]
    fn lab_test_delete() {
        let conn = test_db();
        let p = make_patient(&conn, "P-1");
        let stored = insert_lab_test(&conn, p.id, &lab("ALT", 1.0, 0)).unwrap();
        assert_eq!(stored.status, LabStatus::Normal);
        delete_lab_test(&conn, stored.id).unwrap();
        assert!(get_lab_test(&conn, stored.id).unwrap().is_none());
        assert!(matches!(
            delete_lab_test(&conn, stored.id).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }

    #[test]
    fn reports_join_patient_details_newest_first() {
        let conn = test_db();
        let p = make_patient(&conn, "P-1");
        let older = NewMedicalReport {
            patient_id: p.id,
            diagnosis: "Normal".into(),
            confidence: 95.0,
            advice: "Routine.".into(),
        };
        insert_report_at(&conn, &older, Utc::now() - Duration::days(3)).unwrap();
        insert_report(
            &conn,
            &NewMedicalReport {
                diagnosis: "Hepatitis C (Stage 2)".into(),
                confidence: 88.0,
                ..older.clone()
            },
        )
        .unwrap();

        let joined = list_reports_with_patients(&conn, None).unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].report.diagnosis, "Hepatitis C (Stage 2)");
        assert_eq!(joined[1].report.diagnosis, "Normal");
        let patient = joined[0].patient.as_ref().unwrap();
        assert_eq!(patient.patient_id, "P-1");
        assert_eq!(patient.department.as_deref(), Some("Hepatology"));
    }

    #[test]
    fn report_update_validates_patient_and_confidence() {
        let conn = test_db();
        let p = make_patient(&conn, "P-1");
        let q = make_patient(&conn, "P-2");
        let report = insert_report(
            &conn,
            &NewMedicalReport {
                patient_id: p.id,
                diagnosis: "Normal".into(),
                confidence: 95.0,
                advice: "Routine.".into(),
            },
        )
        .unwrap();

        let moved = update_report(
            &conn,
            report.id,
            &ReportUpdate {
                patient_id: Some(q.id),
                advice: Some("Recheck in 3 months.".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(moved.patient_id, q.id);
        assert_eq!(moved.diagnosis, "Normal");
        assert_eq!(get_report(&conn, report.id).unwrap().unwrap().advice, "Recheck in 3 months.");

        let bad_patient = ReportUpdate {
            patient_id: Some(9999),
            ..Default::default()
        };
        assert!(matches!(
            update_report(&conn, report.id, &bad_patient).unwrap_err(),
            DatabaseError::ConstraintViolation(_)
        ));

        let bad_confidence = ReportUpdate {
            confidence: Some(140.0),
            ..Default::default()
        };
        assert!(matches!(
            update_report(&conn, report.id, &bad_confidence).unwrap_err(),
            DatabaseError::ConstraintViolation(_)
        ));

        assert!(matches!(
            update_report(&conn, 777, &ReportUpdate::default()).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }

    #[test]
    fn report_delete() {
        let conn = test_db();
        let p = make_patient(&conn, "P-1");
        let report = insert_report(
            &conn,
            &NewMedicalReport {
                patient_id: p.id,
                diagnosis: "Normal".into(),
                confidence: 50.0,
                advice: String::new(),
            },
        )
        .unwrap();
        delete_report(&conn, report.id).unwrap();
        assert_eq!(count_reports(&conn).unwrap(), 0);
        assert!(delete_report(&conn, report.id).is_err());
    }
}
