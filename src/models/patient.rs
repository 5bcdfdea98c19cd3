use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    /// Externally visible identifier, e.g. `P-2024-001`.
    pub patient_id: String,
    pub birth_date: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    pub department: Option<String>,
    pub doctor_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub patient_id: String,
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

/// Partial update. An absent field is left alone; an explicit `null` on an
/// optional field clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PatientUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub birth_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub profile_picture: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub department: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub doctor_name: Option<Option<String>>,
}

impl PatientUpdate {
    /// Apply the supplied fields to `patient`.
    pub fn apply_to(&self, patient: &mut Patient) {
        if let Some(name) = &self.name {
            patient.name = name.clone();
        }
        if let Some(patient_id) = &self.patient_id {
            patient.patient_id = patient_id.clone();
        }
        let optional = [
            (&self.birth_date, &mut patient.birth_date),
            (&self.email, &mut patient.email),
            (&self.phone, &mut patient.phone),
            (&self.profile_picture, &mut patient.profile_picture),
            (&self.department, &mut patient.department),
            (&self.doctor_name, &mut patient.doctor_name),
        ];
        for (update, field) in optional {
            if let Some(value) = update {
                *field = value.clone();
            }
        }
    }
}

/// Distinguishes a present `null` (`Some(None)`) from an absent key (`None`).
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
