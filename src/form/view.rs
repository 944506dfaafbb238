//! Headless form surface: what the page would show after each step.
//!
//! DESIGN
//! ======
//! One `FormView` per form, shared as `Arc<Mutex<_>>` between the submitter
//! and whoever renders it. The lock is never held across an await. Banners
//! carry a generation number so a hide timer scheduled for an older banner
//! never hides a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::types::FieldErrors;

/// Public URL prefix for stored uploads.
pub const UPLOADS_PREFIX: &str = "/uploads/";

pub type SharedFormView = Arc<Mutex<FormView>>;

/// Lock a shared view, recovering from a poisoned lock.
pub fn lock(view: &SharedFormView) -> MutexGuard<'_, FormView> {
    view.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Failure,
}

/// The image input area of the edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageWidget {
    /// Only the file input and its error placeholder.
    #[default]
    NoImage,
    /// "Currently: <link> Clear [ ] Change:" ahead of the file input.
    Current { path: String, href: String, clear_checked: bool },
}

/// Bytes pushed to the transport so far for the upload part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: Option<u64>,
}

impl UploadProgress {
    /// `sent / total × 100`; `None` when the total is unknown or zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.sent as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormView {
    pub inputs_disabled: bool,
    pub loading: bool,
    /// Width of the progress bar, in percent.
    pub progress_percent: Option<f64>,
    pub banner: Option<BannerKind>,
    banner_generation: u64,
    /// Inline messages from the client-side pre-check.
    pub validation_errors: FieldErrors,
    /// Server messages, prepended into each field's container.
    pub server_errors: FieldErrors,
    pub image_preview: Option<String>,
    pub image_widget: ImageWidget,
    /// File name currently selected in the image input.
    pub file_selected: Option<String>,
}

impl FormView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared(self) -> SharedFormView {
        Arc::new(Mutex::new(self))
    }

    /// Enter the in-flight state. Returns `false` if already in flight.
    pub fn block(&mut self) -> bool {
        if self.inputs_disabled {
            return false;
        }
        self.inputs_disabled = true;
        self.loading = true;
        self.banner = None;
        self.progress_percent = None;
        true
    }

    /// Leave the in-flight state and drop any server messages on display.
    pub fn unblock(&mut self) {
        self.inputs_disabled = false;
        self.loading = false;
        self.server_errors.clear();
    }

    pub fn report_progress(&mut self, progress: UploadProgress) {
        if let Some(percent) = progress.percent() {
            self.progress_percent = Some(percent);
        }
    }

    /// Show a banner and return its generation for the hide timer.
    pub fn show_banner(&mut self, kind: BannerKind) -> u64 {
        self.banner_generation += 1;
        self.banner = Some(kind);
        self.banner_generation
    }

    /// Hide the banner only if it is still the one shown at `generation`.
    pub fn hide_banner(&mut self, generation: u64) {
        if self.banner_generation == generation {
            self.banner = None;
        }
    }

    pub fn show_validation_errors(&mut self, errors: FieldErrors) {
        self.validation_errors = errors;
    }

    pub fn show_server_errors(&mut self, errors: &FieldErrors) {
        for (field, messages) in errors {
            self.server_errors.prepend(field.clone(), messages.iter().cloned());
        }
    }

    /// Reset the validation UI and remove every displayed field error.
    pub fn reset_errors(&mut self) {
        self.validation_errors.clear();
        self.server_errors.clear();
    }

    /// Create form: point the preview at the stored image.
    pub fn show_saved_image(&mut self, image: &str) {
        self.image_preview = upload_href(image);
    }

    /// Edit form: also rebuild the image widget around the file input.
    pub fn show_edited_image(&mut self, image: &str) {
        self.show_saved_image(image);
        match upload_href(image) {
            None => self.image_widget = ImageWidget::NoImage,
            Some(href) => {
                self.image_widget = ImageWidget::Current { path: image.to_string(), href, clear_checked: false };
                self.file_selected = None;
            }
        }
    }
}

/// `/uploads/<path>`, or `None` for the empty path.
#[must_use]
pub fn upload_href(image: &str) -> Option<String> {
    (!image.is_empty()).then(|| format!("{UPLOADS_PREFIX}{image}"))
}

/// Hide the banner of `generation` after `delay`.
pub fn schedule_banner_hide(view: SharedFormView, generation: u64, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        lock(&view).hide_banner(generation);
    });
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
