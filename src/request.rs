//! Request assembly: form state + selected image → [`GenerationRequest`].
//!
//! Building a request is a pure snapshot of the form. Nothing is read from
//! disk here; the image file is only opened by the transport when the body
//! is sent. A request captured before an edit keeps the old values, which is
//! what lets a pipeline run undisturbed while the user keeps typing.
//!
//! ## Wire fields
//!
//! | field | value |
//! |---|---|
//! | `file` | the image, sent as `upload.jpg` / `image/jpeg` |
//! | `target_width_cm`, `target_height_cm` | canonical size |
//! | `filter_type` | `color` \| `bw` \| `outline` |
//! | `orientation` | `portrait` \| `landscape` |
//! | `add_margins` | `true` \| `false` |
//! | `margin_x_cm`, `margin_y_cm` | canonical margins, `0` when disabled |

use crate::form::{Axis, Filter, FormState, Orientation};
use crate::pipeline::PipelineError;
use crate::units::CanonicalMeasurement;
use std::path::{Path, PathBuf};

/// Filename the image part is uploaded under.
pub const UPLOAD_FILE_NAME: &str = "upload.jpg";
/// Content type declared for the image part.
pub const UPLOAD_MIME: &str = "image/jpeg";

/// A local image picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub path: PathBuf,
}

impl SelectedImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Everything the rendering service needs for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub image: SelectedImage,
    pub width: CanonicalMeasurement,
    pub height: CanonicalMeasurement,
    pub filter: Filter,
    pub orientation: Orientation,
    pub add_margins: bool,
    pub margin_x: CanonicalMeasurement,
    pub margin_y: CanonicalMeasurement,
}

impl GenerationRequest {
    /// Text fields of the multipart body, in wire order.
    ///
    /// The margin fields are always present, zero-filled when margins are
    /// disabled.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("target_width_cm", self.width.to_field()),
            ("target_height_cm", self.height.to_field()),
            ("filter_type", self.filter.as_str().to_string()),
            ("orientation", self.orientation.as_str().to_string()),
            ("add_margins", self.add_margins.to_string()),
            ("margin_x_cm", self.margin_x.to_field()),
            ("margin_y_cm", self.margin_y.to_field()),
        ]
    }
}

/// Snapshot `form` into a request for `image`.
///
/// Fails with [`PipelineError::NoImageSelected`] when no image is selected.
/// Stored margin values are ignored (but left untouched in the form) while
/// margins are disabled.
pub fn build_request(
    form: &FormState,
    image: Option<&SelectedImage>,
) -> Result<GenerationRequest, PipelineError> {
    let image = image.ok_or(PipelineError::NoImageSelected)?;

    let (margin_x, margin_y) = if form.margins_enabled {
        (
            form.input(Axis::MarginX).normalize(),
            form.input(Axis::MarginY).normalize(),
        )
    } else {
        (CanonicalMeasurement::ZERO, CanonicalMeasurement::ZERO)
    };

    Ok(GenerationRequest {
        image: image.clone(),
        width: form.input(Axis::Width).normalize(),
        height: form.input(Axis::Height).normalize(),
        filter: form.filter,
        orientation: form.orientation,
        add_margins: form.margins_enabled,
        margin_x,
        margin_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Component, FormEvent};
    use crate::units::UnitSystem;

    fn image() -> SelectedImage {
        SelectedImage::new("/photos/cat.jpg")
    }

    fn field<'a>(fields: &'a [(&'static str, String)], name: &str) -> &'a str {
        fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing field {name}"))
    }

    #[test]
    fn no_image_is_rejected() {
        let err = build_request(&FormState::default(), None).unwrap_err();
        assert!(matches!(err, PipelineError::NoImageSelected));
    }

    #[test]
    fn default_form_fields() {
        let req = build_request(&FormState::default(), Some(&image())).unwrap();
        let fields = req.text_fields();
        let names: Vec<_> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            [
                "target_width_cm",
                "target_height_cm",
                "filter_type",
                "orientation",
                "add_margins",
                "margin_x_cm",
                "margin_y_cm",
            ]
        );
        assert_eq!(field(&fields, "target_width_cm"), "100");
        assert_eq!(field(&fields, "filter_type"), "color");
        assert_eq!(field(&fields, "orientation"), "portrait");
        assert_eq!(field(&fields, "add_margins"), "false");
    }

    #[test]
    fn disabled_margins_are_zero_whatever_is_stored() {
        let mut form = FormState::default();
        form.apply(FormEvent::SetValue {
            axis: Axis::MarginX,
            component: Component::Centimeters,
            value: 12.0,
        });
        form.apply(FormEvent::SetMarginUnit(UnitSystem::Imperial));
        form.apply(FormEvent::SetValue {
            axis: Axis::MarginY,
            component: Component::Feet,
            value: 4.0,
        });

        let fields = build_request(&form, Some(&image())).unwrap().text_fields();
        assert_eq!(field(&fields, "margin_x_cm"), "0");
        assert_eq!(field(&fields, "margin_y_cm"), "0");

        // Stored values survive for when margins come back on.
        assert_eq!(form.margin_x.centimeters, 12.0);
        assert_eq!(form.margin_y.feet, 4.0);
    }

    #[test]
    fn enabled_margins_use_margin_unit() {
        let mut form = FormState::default();
        form.apply(FormEvent::SetMargins(true));
        form.apply(FormEvent::SetMarginUnit(UnitSystem::Imperial));

        let fields = build_request(&form, Some(&image())).unwrap().text_fields();
        assert_eq!(field(&fields, "add_margins"), "true");
        assert_eq!(field(&fields, "margin_x_cm"), "5.08");
        assert_eq!(field(&fields, "margin_y_cm"), "5.08");
        // Size axes still metric.
        assert_eq!(field(&fields, "target_height_cm"), "100");
    }

    #[test]
    fn imperial_size_is_converted() {
        let mut form = FormState::default();
        form.apply(FormEvent::SetSizeUnit(UnitSystem::Imperial));
        let fields = build_request(&form, Some(&image())).unwrap().text_fields();
        assert_eq!(field(&fields, "target_width_cm"), "99.06");
        assert_eq!(field(&fields, "target_height_cm"), "99.06");
    }

    #[test]
    fn snapshot_is_not_affected_by_later_edits() {
        let mut form = FormState::default();
        let req = build_request(&form, Some(&image())).unwrap();
        form.apply(FormEvent::SetValue {
            axis: Axis::Width,
            component: Component::Centimeters,
            value: 1.0,
        });
        assert_eq!(req.width.to_field(), "100");
    }
}
