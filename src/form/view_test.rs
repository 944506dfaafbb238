use super::*;

fn errors(pairs: &[(&str, &str)]) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, message) in pairs {
        out.push(*field, *message);
    }
    out
}

#[test]
fn block_is_single_flight() {
    let mut view = FormView::new();
    view.banner = Some(BannerKind::Success);

    assert!(view.block());
    assert!(view.inputs_disabled && view.loading);
    assert_eq!(view.banner, None, "next submission closes the previous banner");
    assert!(!view.block());
}

#[test]
fn unblock_reenables_and_clears_server_errors() {
    let mut view = FormView::new();
    view.block();
    view.show_server_errors(&errors(&[("name", "bad")]));

    view.unblock();
    assert!(!view.inputs_disabled && !view.loading);
    assert!(view.server_errors.is_empty());
}

#[test]
fn progress_ignores_unknown_totals() {
    let mut view = FormView::new();
    view.report_progress(UploadProgress { sent: 10, total: None });
    assert_eq!(view.progress_percent, None);

    view.report_progress(UploadProgress { sent: 0, total: Some(0) });
    assert_eq!(view.progress_percent, None);

    view.report_progress(UploadProgress { sent: 25, total: Some(100) });
    assert_eq!(view.progress_percent, Some(25.0));
}

#[test]
fn stale_generation_does_not_hide_newer_banner() {
    let mut view = FormView::new();
    let first = view.show_banner(BannerKind::Failure);
    let second = view.show_banner(BannerKind::Success);

    view.hide_banner(first);
    assert_eq!(view.banner, Some(BannerKind::Success));
    view.hide_banner(second);
    assert_eq!(view.banner, None);
}

#[test]
fn reset_errors_is_idempotent() {
    let mut view = FormView::new();
    view.show_validation_errors(errors(&[("email", "bad")]));
    view.show_server_errors(&errors(&[("name", "bad")]));

    view.reset_errors();
    view.reset_errors();
    assert!(view.validation_errors.is_empty());
    assert!(view.server_errors.is_empty());
}

#[test]
fn saved_image_sets_preview() {
    let mut view = FormView::new();
    view.show_saved_image("photos/me.png");
    assert_eq!(view.image_preview.as_deref(), Some("/uploads/photos/me.png"));

    view.show_saved_image("");
    assert_eq!(view.image_preview, None);
}

#[test]
fn edited_image_with_path_shows_current_and_blanks_file_input() {
    let mut view = FormView::new();
    view.file_selected = Some("me.png".into());

    view.show_edited_image("photos/me.png");
    assert_eq!(
        view.image_widget,
        ImageWidget::Current {
            path: "photos/me.png".into(),
            href: "/uploads/photos/me.png".into(),
            clear_checked: false,
        }
    );
    assert_eq!(view.file_selected, None);
}

#[test]
fn edited_image_cleared_returns_to_no_image() {
    let mut view = FormView::new();
    view.image_widget = ImageWidget::Current { path: "a.png".into(), href: "/uploads/a.png".into(), clear_checked: true };
    view.image_preview = Some("/uploads/a.png".into());

    view.show_edited_image("");
    assert_eq!(view.image_widget, ImageWidget::NoImage);
    assert_eq!(view.image_preview, None);
}

#[tokio::test(start_paused = true)]
async fn banner_hides_after_delay() {
    let view = FormView::new().shared();
    let generation = lock(&view).show_banner(BannerKind::Success);
    schedule_banner_hide(view.clone(), generation, Duration::from_millis(5000));

    tokio::time::sleep(Duration::from_millis(4999)).await;
    assert_eq!(lock(&view).banner, Some(BannerKind::Success));

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(lock(&view).banner, None);
}
