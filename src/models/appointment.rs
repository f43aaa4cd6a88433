use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: String,
    pub phone: String,
    pub age: String,
    pub gender: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    pub branch: String,
    pub speciality: String,
    pub doctor: String,
    pub notes: String,
    pub patient_details: PatientDetails,
    pub terms_agreed: bool,
    pub appointment_date: String,
}

/// Status every new appointment is stored with.
pub const PENDING_STATUS: &str = "Pending";

/// The document written to the store: the submitted record plus server-side
/// bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAppointment {
    #[serde(flatten)]
    pub record: AppointmentRecord,
    pub timestamp: String,
    pub status: String,
}

impl StoredAppointment {
    pub fn new(record: AppointmentRecord, submitted_at: DateTime<Utc>) -> Self {
        Self {
            record,
            timestamp: submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            status: PENDING_STATUS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub success: bool,
    pub message: String,
}

impl SubmitResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
