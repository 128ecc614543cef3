pub mod error;
pub mod report;
pub mod validate;

// Re-export the core types to provide a clean public API.
pub use error::{FieldViolation, ValidationError};
pub use report::{NewSoilReport, SoilReport, SoilReportPatch};
pub use validate::{validate_new_report, validate_patch};
