use serde::{Deserialize, Deserializer};

use crate::errors::AppError;
use crate::models::{AppointmentRecord, PatientDetails};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientMode {
    #[default]
    New,
    Registered,
}

impl PatientMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientMode::New => "new",
            PatientMode::Registered => "registered",
        }
    }

    pub fn shows_patient_details(&self) -> bool {
        matches!(self, PatientMode::New)
    }
}

/// Raw submission as it arrives from the booking form or the JSON API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentForm {
    #[serde(default)]
    pub mode: PatientMode,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub speciality: String,
    #[serde(default)]
    pub doctor: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default, deserialize_with = "deserialize_checkbox")]
    pub terms: bool,
    #[serde(default, alias = "appointmentDate")]
    pub appointment_date: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Checkbox {
    Bool(bool),
    Text(String),
}

// HTML checkboxes post "on" when ticked and nothing otherwise.
fn deserialize_checkbox<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Checkbox::deserialize(deserializer)? {
        Checkbox::Bool(b) => b,
        Checkbox::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "on" | "true" | "1" | "yes"
        ),
    })
}

impl AppointmentForm {
    /// Patient detail fields only count in new-patient mode.
    pub fn patient_details(&self) -> PatientDetails {
        if !self.mode.shows_patient_details() {
            return PatientDetails::default();
        }
        PatientDetails {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            age: self.age.trim().to_string(),
            gender: self.gender.trim().to_string(),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let patient = self.patient_details();
        let mut missing = vec![];
        for (field, value) in [
            ("branch", self.branch.as_str()),
            ("speciality", self.speciality.as_str()),
            ("doctor", self.doctor.as_str()),
            ("name", patient.name.as_str()),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        if !self.terms {
            missing.push("terms");
        }
        missing
    }

    pub fn into_record(self, default_date: &str) -> Result<AppointmentRecord, AppError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Validation(missing));
        }

        let appointment_date = match self.appointment_date.trim() {
            "" => default_date.to_string(),
            date => date.to_string(),
        };

        Ok(AppointmentRecord {
            patient_details: self.patient_details(),
            branch: self.branch.trim().to_string(),
            speciality: self.speciality.trim().to_string(),
            doctor: self.doctor.trim().to_string(),
            notes: self.notes.trim().to_string(),
            terms_agreed: self.terms,
            appointment_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> AppointmentForm {
        AppointmentForm {
            branch: "North".to_string(),
            speciality: "Dermatology".to_string(),
            doctor: "Dr. A".to_string(),
            name: "Jane".to_string(),
            terms: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form_builds_record() {
        let record = valid_form().into_record("October 22, 2025").unwrap();
        assert_eq!(record.branch, "North");
        assert_eq!(record.patient_details.name, "Jane");
        assert_eq!(record.appointment_date, "October 22, 2025");
        assert!(record.terms_agreed);
    }

    #[test]
    fn test_explicit_date_wins() {
        let form = AppointmentForm {
            appointment_date: " November 3, 2025 ".to_string(),
            ..valid_form()
        };
        let record = form.into_record("October 22, 2025").unwrap();
        assert_eq!(record.appointment_date, "November 3, 2025");
    }

    #[test]
    fn test_each_required_field_blocks() {
        let cases: Vec<(&str, AppointmentForm)> = vec![
            ("branch", AppointmentForm { branch: String::new(), ..valid_form() }),
            ("speciality", AppointmentForm { speciality: "  ".to_string(), ..valid_form() }),
            ("doctor", AppointmentForm { doctor: String::new(), ..valid_form() }),
            ("name", AppointmentForm { name: String::new(), ..valid_form() }),
            ("terms", AppointmentForm { terms: false, ..valid_form() }),
        ];
        for (field, form) in cases {
            match form.into_record("d") {
                Err(AppError::Validation(missing)) => assert_eq!(missing, vec![field]),
                other => panic!("expected validation error for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_registered_mode_drops_patient_fields() {
        let form = AppointmentForm {
            mode: PatientMode::Registered,
            phone: "555".to_string(),
            ..valid_form()
        };
        assert_eq!(form.patient_details(), PatientDetails::default());
        assert_eq!(form.missing_fields(), vec!["name"]);
    }

    #[test]
    fn test_checkbox_from_urlencoded_and_json() {
        let json: AppointmentForm = serde_json::from_str(r#"{"terms":true}"#).unwrap();
        assert!(json.terms);
        let text: AppointmentForm = serde_json::from_str(r#"{"terms":"on"}"#).unwrap();
        assert!(text.terms);
        let off: AppointmentForm = serde_json::from_str(r#"{"terms":"off"}"#).unwrap();
        assert!(!off.terms);
        let absent: AppointmentForm = serde_json::from_str("{}").unwrap();
        assert!(!absent.terms);
        assert_eq!(absent.mode, PatientMode::New);
    }

    #[test]
    fn test_appointment_date_accepts_camel_case() {
        let camel: AppointmentForm =
            serde_json::from_str(r#"{"appointmentDate":"November 3, 2025"}"#).unwrap();
        assert_eq!(camel.appointment_date, "November 3, 2025");
        let snake: AppointmentForm =
            serde_json::from_str(r#"{"appointment_date":"November 4, 2025"}"#).unwrap();
        assert_eq!(snake.appointment_date, "November 4, 2025");
    }
}
