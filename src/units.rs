//! Unit normalization: everything the server sees is in centimeters.
//!
//! The form lets the user type sizes either in centimeters or as a
//! feet + inches pair. Before a request is built, every axis is reduced to a
//! single [`CanonicalMeasurement`] using
//!
//! ```text
//! cm = feet × 30.48 + inches × 2.54
//! ```
//!
//! rounded to two decimal places. Metric input passes through unchanged.
//!
//! No validation happens here. Zero, negative and NaN values flow through
//! as-is; the rendering service decides what to do with them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Centimeters per foot.
pub const CM_PER_FOOT: f64 = 30.48;
/// Centimeters per inch.
pub const CM_PER_INCH: f64 = 2.54;

/// Which unit system an axis group (size or margins) is entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Centimeters.
    #[default]
    #[value(name = "cm")]
    #[serde(rename = "cm")]
    Metric,
    /// Feet and inches.
    #[value(name = "ft")]
    #[serde(rename = "ft")]
    Imperial,
}

impl UnitSystem {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitSystem::Metric => "cm",
            UnitSystem::Imperial => "ft",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One axis of user input, in whichever system is active for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasurementInput {
    Metric { centimeters: f64 },
    Imperial { feet: f64, inches: f64 },
}

impl MeasurementInput {
    /// Reduce to centimeters.
    pub fn normalize(self) -> CanonicalMeasurement {
        match self {
            MeasurementInput::Metric { centimeters } => CanonicalMeasurement(centimeters),
            MeasurementInput::Imperial { feet, inches } => {
                CanonicalMeasurement(round_cm(to_cm(feet, inches)))
            }
        }
    }
}

/// A dimension in centimeters, ready to be sent as a form field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanonicalMeasurement(pub f64);

impl CanonicalMeasurement {
    pub const ZERO: CanonicalMeasurement = CanonicalMeasurement(0.0);

    pub fn centimeters(self) -> f64 {
        self.0
    }

    /// Text representation for the multipart body.
    ///
    /// The stored value is printed as is: integral values have no
    /// fractional part (`50`, `0`), others keep every digit they have
    /// (`12.345`). Imperial input was already rounded by
    /// [`MeasurementInput::normalize`]. Non-finite values are sent as
    /// `NaN`, `Infinity` or `-Infinity`.
    pub fn to_field(self) -> String {
        let cm = self.0;
        if cm.is_nan() {
            return "NaN".to_string();
        }
        if cm.is_infinite() {
            return if cm > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        // No "-0".
        if cm == 0.0 {
            return "0".to_string();
        }
        format!("{cm}")
    }
}

impl fmt::Display for CanonicalMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_field())
    }
}

/// Exact feet + inches conversion, unrounded.
pub fn to_cm(feet: f64, inches: f64) -> f64 {
    feet * CM_PER_FOOT + inches * CM_PER_INCH
}

/// Round to two decimal places.
///
/// Values too large to scale are returned unrounded; they have no
/// fractional digits anyway.
pub fn round_cm(cm: f64) -> f64 {
    let scaled = cm * 100.0;
    if !scaled.is_finite() {
        return cm;
    }
    scaled.round() / 100.0
}

/// Coerce text typed into a numeric field the way a numeric text input does.
///
/// - surrounding whitespace is ignored
/// - empty text is `0`
/// - anything unparsable is `NaN`
/// - the only spellings of infinity are `Infinity`, `+Infinity` and
///   `-Infinity`; `inf`, `infinity` and `nan` in other cases are `NaN`
pub fn coerce_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    f64::from_str(trimmed)
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(f64::NAN)
}
