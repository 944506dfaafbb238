//! The person record edited by the form and its client-side pre-checks.
//!
//! Rules mirror the server's model form: names of 3–16 characters, an ISO
//! calendar date, a syntactically valid email and an `image/*` upload. The
//! edit form adds a "Clear" checkbox which must not be combined with a new
//! file.

use std::borrow::Cow;

use chrono::NaiveDate;
use validator::{Validate, ValidateEmail, ValidationError};

use super::types::FieldErrors;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
const INVALID_EMAIL_MESSAGE: &str = "Enter a valid email address.";
pub const BOTH_IMAGE_ACTIONS_MESSAGE: &str = "Please either submit a file or check the clear checkbox, not both.";

/// A file chosen in the image input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Build an upload, guessing nothing: `content_type` is taken as given.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), bytes }
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type
            .parse::<mime::Mime>()
            .is_ok_and(|m| m.type_() == mime::IMAGE)
    }
}

/// Form contents as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct FormRecord {
    #[validate(length(min = 3, max = 16, message = "Ensure this value has between 3 and 16 characters."))]
    pub name: String,
    #[validate(length(min = 3, max = 16, message = "Ensure this value has between 3 and 16 characters."))]
    pub surname: String,
    #[validate(custom(function = "validate_calendar_date"))]
    pub date_of_birth: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub bio: String,
    /// Optional; blank counts as absent.
    pub jabber: Option<String>,
    pub skype_id: String,
    pub other: String,
    pub image: Option<ImageUpload>,
    /// Edit form only: the "Clear" checkbox next to the current image.
    pub clear_image: bool,
}

impl FormRecord {
    /// Run every client-side rule and collect messages per field.
    ///
    /// # Errors
    ///
    /// Returns the offending fields and their messages.
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(&e),
        };

        if let Some(jabber) = self.jabber.as_ref().filter(|j| !j.trim().is_empty()) {
            if !jabber.validate_email() {
                errors.push("jabber", INVALID_EMAIL_MESSAGE);
            }
        }

        if let Some(image) = &self.image {
            if !image.is_image() {
                errors.push("image", "Upload a valid image.");
            }
            if self.clear_image {
                errors.push("image", BOTH_IMAGE_ACTIONS_MESSAGE);
            }
        }

        errors.into_result()
    }

    /// Text fields in form order, as sent in the multipart body.
    #[must_use]
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("name", self.name.clone()),
            ("surname", self.surname.clone()),
            ("date_of_birth", self.date_of_birth.clone()),
            ("bio", self.bio.clone()),
            ("email", self.email.clone()),
            ("jabber", self.jabber.clone().unwrap_or_default()),
            ("skype_id", self.skype_id.clone()),
            ("other", self.other.clone()),
        ];
        if self.clear_image {
            fields.push(("image-clear", "on".to_string()));
        }
        fields
    }
}

fn validate_calendar_date(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("This field is required."));
        return Err(err);
    }
    if NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).is_err() {
        let mut err = ValidationError::new("date");
        err.message = Some(Cow::Borrowed("Enter a valid date."));
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
