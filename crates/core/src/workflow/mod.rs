//! Clinical workflow engine.
//!
//! Owns transition legality and side effects for triage, bed occupancy, admissions,
//! appointments, prescriptions and documents. Every operation takes the connection it works
//! on; multi-statement changes run in one `BEGIN IMMEDIATE` transaction, so concurrent callers
//! cannot both observe a bed as free or an admission as still active.

mod directory;
mod inpatient;
mod intake;
mod orders;
mod outpatient;
mod records;

pub use directory::{add_staff, list_doctors, list_staff};
pub use inpatient::{add_bed, admit, assign_bed, discharge, list_beds, transfer, BedAssignment};
pub use intake::{get_patient, high_priority_alerts, list_patients, register_patient, set_triage};
pub use orders::{create_prescription, prescriptions_for_patient};
pub use outpatient::{list_appointments, schedule, update_appointment_status};
pub use records::{document_content, documents_for_patient, upload_document};
