// certdesk core - certificate codes, form validation and PDF rendering

pub mod code;
pub mod color;
pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod render;
pub mod surface;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use code::{generate_unique_code, is_valid_code};
pub use layout::{TemplateLayout, TemplatePreset};
pub use pdf::CertificateDocument;
pub use render::{render_certificate, CertificateAssets};
pub use surface::RasterImage;
pub use types::{certificate_file_name, safe_file_name, Branding, CertificatePayload};
pub use validate::{is_valid_email, CertificateForm, FormError};

// Image decoding shared with downstream crates.
pub use printpdf::image_crate;
