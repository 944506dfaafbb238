//! AJAX-style submission of the person form.
//!
//! FLOW
//! ====
//! 1. Pre-check the record; on failure mark the fields and stop.
//! 2. Block the form (inputs disabled, loader shown, old banner closed).
//! 3. POST `multipart/form-data` to the form action, with the CSRF header
//!    when the method and origin require it. The image part is streamed in
//!    chunks so upload progress can be reported.
//! 4. Unblock, show a banner that hides itself after the configured delay,
//!    then either refresh the image preview or distribute field errors.
//!
//! Transport failures share the failure treatment of a rejected submission.

use std::time::Duration;

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method, Url};
use tracing::{info, warn};

use super::record::{FormRecord, ImageUpload};
use super::types::{FieldErrors, SubmitError, SubmitSuccess, parse_error_body, parse_success_body};
use super::view::{BannerKind, FormView, SharedFormView, UploadProgress, lock, schedule_banner_hide};
use crate::csrf::RequestConfig;

const UPLOAD_CHUNK_BYTES: usize = 16 * 1024;

/// Which page the form lives on; selects how a saved image is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormVariant {
    #[default]
    Create,
    Edit,
}

/// The form's declared `action` and `method`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTarget {
    pub action: String,
    pub method: Method,
}

impl FormTarget {
    #[must_use]
    pub fn post(action: impl Into<String>) -> Self {
        Self { action: action.into(), method: Method::POST }
    }
}

pub struct FormSubmitter {
    http: reqwest::Client,
    request: RequestConfig,
    target: FormTarget,
    variant: FormVariant,
    banner_delay: Duration,
    view: SharedFormView,
}

impl FormSubmitter {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        request: RequestConfig,
        target: FormTarget,
        variant: FormVariant,
        banner_delay: Duration,
    ) -> Self {
        Self { http, request, target, variant, banner_delay, view: FormView::new().shared() }
    }

    /// Render into an existing view instead of a fresh one.
    #[must_use]
    pub fn with_view(mut self, view: SharedFormView) -> Self {
        self.view = view;
        self
    }

    #[must_use]
    pub fn view(&self) -> SharedFormView {
        self.view.clone()
    }

    /// Client-side pre-check. Marks offending fields on failure and clears
    /// earlier marks on success.
    ///
    /// # Errors
    ///
    /// Returns the rejected fields and their messages.
    pub fn validate(&self, record: &FormRecord) -> Result<(), FieldErrors> {
        let outcome = record.check();
        let mut view = lock(&self.view);
        match &outcome {
            Ok(()) => view.validation_errors.clear(),
            Err(errors) => view.show_validation_errors(errors.clone()),
        }
        outcome
    }

    /// Validate and submit `record`. The view reflects every step.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::ClientValidation`] if the pre-check fails (nothing sent).
    /// - [`SubmitError::Busy`] if another submission is in flight.
    /// - [`SubmitError::ServerValidation`] if the server rejects the fields.
    /// - [`SubmitError::Transport`] and the `Malformed*` variants otherwise.
    pub async fn submit(&self, record: &FormRecord) -> Result<SubmitSuccess, SubmitError> {
        self.validate(record).map_err(SubmitError::ClientValidation)?;
        let url = self.request.resolve(&self.target.action).map_err(SubmitError::InvalidAction)?;
        let form = self.build_form(record)?;

        {
            let mut view = lock(&self.view);
            if !view.block() {
                return Err(SubmitError::Busy);
            }
            view.file_selected = record.image.as_ref().map(|image| image.file_name.clone());
        }

        let outcome = self.send(url, form).await;
        self.finish(&outcome);
        outcome
    }

    /// Reset the validation UI and drop displayed errors without submitting.
    pub fn cancel(&self) {
        lock(&self.view).reset_errors();
    }

    fn build_form(&self, record: &FormRecord) -> Result<Form, SubmitError> {
        let mut form = Form::new();
        for (name, value) in record.text_fields() {
            form = form.text(name, value);
        }
        if let Some(image) = &record.image {
            form = form.part("image", self.image_part(image)?);
        }
        Ok(form)
    }

    fn image_part(&self, image: &ImageUpload) -> Result<Part, SubmitError> {
        let total = image.bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = image.bytes.chunks(UPLOAD_CHUNK_BYTES).map(<[u8]>::to_vec).collect();
        let view = self.view.clone();
        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            lock(&view).report_progress(UploadProgress { sent, total: Some(total) });
            Ok::<_, std::io::Error>(chunk)
        });

        Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| SubmitError::InvalidUpload(e.to_string()))
    }

    async fn send(&self, url: Url, form: Form) -> Result<SubmitSuccess, SubmitError> {
        let method = self.target.method.clone();
        let builder = self.http.request(method.clone(), url.clone());
        let response = self
            .request
            .apply(builder, &method, &url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SubmitError::Transport(e.to_string()))?;
        info!(%url, status = status.as_u16(), "form submission answered");

        if status.is_success() {
            parse_success_body(&body)
        } else {
            Err(parse_error_body(status.as_u16(), &body))
        }
    }

    fn finish(&self, outcome: &Result<SubmitSuccess, SubmitError>) {
        let generation = {
            let mut view = lock(&self.view);
            view.unblock();
            match outcome {
                Ok(saved) => {
                    match self.variant {
                        FormVariant::Create => view.show_saved_image(&saved.image),
                        FormVariant::Edit => view.show_edited_image(&saved.image),
                    }
                    view.show_banner(BannerKind::Success)
                }
                Err(err) => {
                    warn!(error = %err, "form submission failed");
                    if let SubmitError::ServerValidation { errors, .. } = err {
                        view.show_server_errors(errors);
                    }
                    view.show_banner(BannerKind::Failure)
                }
            }
        };
        schedule_banner_hide(self.view.clone(), generation, self.banner_delay);
    }
}

#[cfg(test)]
#[path = "submit_test.rs"]
mod tests;
