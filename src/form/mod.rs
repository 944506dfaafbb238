//! Person form: pre-check, submission and outcome display.

pub mod record;
pub mod submit;
pub mod types;
pub mod view;

pub use record::{FormRecord, ImageUpload};
pub use submit::{FormSubmitter, FormTarget, FormVariant};
pub use types::{FieldErrors, SubmitError, SubmitSuccess};
pub use view::{BannerKind, FormView, ImageWidget, SharedFormView, UploadProgress};
