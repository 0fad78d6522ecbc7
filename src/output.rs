//! CLI output formatting.
//!
//! Each `format_*` function is pure and returns the lines to show, so the
//! layout is testable; the `print_*` wrappers write them out. Results go to
//! stdout, live status (loading messages, stage changes) and notifications
//! to stderr so stdout stays pipeable (`preview --data-uri > preview.txt`).
//!
//! ```text
//! $ stencil-maker fields --image cat.jpg --unit ft
//! file               cat.jpg (upload.jpg, image/jpeg)
//! target_width_cm    99.06
//! target_height_cm   99.06
//! filter_type        color
//! ...
//! ```

use crate::pipeline::{DownloadOutcome, Notification, PipelineEvent, PipelineKind, PreviewImage};
use crate::request::{GenerationRequest, UPLOAD_FILE_NAME, UPLOAD_MIME};

/// Width of the field-name column.
const FIELD_COLUMN: usize = 18;

/// The multipart body of `request`, one field per line.
pub fn format_request(request: &GenerationRequest) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<FIELD_COLUMN$} {} ({}, {})",
        "file",
        request.image.path().display(),
        UPLOAD_FILE_NAME,
        UPLOAD_MIME
    )];
    lines.extend(
        request
            .text_fields()
            .into_iter()
            .map(|(name, value)| format!("{name:<FIELD_COLUMN$} {value}")),
    );
    lines
}

/// The same fields as [`format_request`], as one JSON object.
pub fn request_json(request: &GenerationRequest) -> serde_json::Value {
    let mut fields = serde_json::Map::new();
    fields.insert(
        "file".into(),
        serde_json::json!({
            "path": request.image.path().display().to_string(),
            "name": UPLOAD_FILE_NAME,
            "type": UPLOAD_MIME,
        }),
    );
    for (name, value) in request.text_fields() {
        fields.insert(name.into(), serde_json::Value::String(value));
    }
    serde_json::Value::Object(fields)
}

pub fn format_preview(preview: &PreviewImage) -> Vec<String> {
    let size = match preview.dimensions {
        Some((w, h)) => format!("{w}x{h}"),
        None => "unknown size".to_string(),
    };
    vec![format!(
        "Preview ready: {size}, aspect ratio {:.3}",
        preview.aspect_ratio
    )]
}

pub fn format_download(outcome: &DownloadOutcome) -> Vec<String> {
    match outcome {
        DownloadOutcome::Shared { path } => vec![format!("Shared {path}")],
        DownloadOutcome::Saved { path } => vec![format!("Saved {path}")],
    }
}

pub fn format_notification(note: &Notification) -> String {
    format!("[{}] {}", note.title, note.message)
}

pub fn format_status(kind: PipelineKind, text: &str) -> String {
    format!("{kind:>8} │ {text}")
}

pub fn format_stage(event: &PipelineEvent) -> String {
    format!("{:>8} │ ({})", event.kind, event.stage.as_str())
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

pub fn print_notifications(notes: &[Notification]) {
    for note in notes {
        eprintln!("{}", format_notification(note));
    }
}
