pub mod appointment;
pub mod form;
pub mod session;
pub mod toast;

pub use appointment::{
    AppointmentRecord, PatientDetails, StoredAppointment, SubmitResult,
};
pub use form::{AppointmentForm, PatientMode};
pub use session::{Credentials, Session, SessionSource};
pub use toast::{Toast, ToastEvent, ToastKind};
