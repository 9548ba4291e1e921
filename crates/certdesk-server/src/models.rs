//! Database models for certdesk.

pub mod certificate;
pub mod course;
pub mod institution_config;

pub use certificate::{Certificate, NewCertificate, PublicCertificate};
pub use course::CourseInsert;
pub use institution_config::{ConfigUpdate, InstitutionConfig};
