//! Form state: everything the user has entered, in the units they entered it.
//!
//! Both representations of every axis are kept side by side, so switching a
//! unit system back and forth (or toggling margins off and on) restores what
//! was typed. Only the active representation is ever read when a request is
//! built; see [`crate::request`].
//!
//! State only changes through [`FormState::apply`], one [`FormEvent`] at a
//! time.

use crate::units::{MeasurementInput, UnitSystem};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual filter the server applies before gridding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    Color,
    Bw,
    Outline,
}

impl Filter {
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::Color => "color",
            Filter::Bw => "bw",
            Filter::Outline => "outline",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page orientation of the generated stencil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single axis, holding both the metric and the imperial entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisValues {
    pub centimeters: f64,
    pub feet: f64,
    pub inches: f64,
}

impl AxisValues {
    pub const fn new(centimeters: f64, feet: f64, inches: f64) -> Self {
        Self {
            centimeters,
            feet,
            inches,
        }
    }

    /// The representation selected by `system`.
    pub fn input(&self, system: UnitSystem) -> MeasurementInput {
        match system {
            UnitSystem::Metric => MeasurementInput::Metric {
                centimeters: self.centimeters,
            },
            UnitSystem::Imperial => MeasurementInput::Imperial {
                feet: self.feet,
                inches: self.inches,
            },
        }
    }
}

/// Which of the four measured axes an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
    MarginX,
    MarginY,
}

/// Which part of an axis an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Centimeters,
    Feet,
    Inches,
}

/// Every edit the form accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    SetSizeUnit(UnitSystem),
    SetMarginUnit(UnitSystem),
    SetValue {
        axis: Axis,
        component: Component,
        value: f64,
    },
    SetMargins(bool),
    SetFilter(Filter),
    SetOrientation(Orientation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub size_unit: UnitSystem,
    pub margin_unit: UnitSystem,
    pub width: AxisValues,
    pub height: AxisValues,
    pub margins_enabled: bool,
    /// Left/right margin.
    pub margin_x: AxisValues,
    /// Top/bottom margin.
    pub margin_y: AxisValues,
    pub filter: Filter,
    pub orientation: Orientation,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            size_unit: UnitSystem::Metric,
            margin_unit: UnitSystem::Metric,
            width: AxisValues::new(100.0, 3.0, 3.0),
            height: AxisValues::new(100.0, 3.0, 3.0),
            margins_enabled: false,
            margin_x: AxisValues::new(5.0, 0.0, 2.0),
            margin_y: AxisValues::new(5.0, 0.0, 2.0),
            filter: Filter::Color,
            orientation: Orientation::Portrait,
        }
    }
}

impl FormState {
    pub fn apply(&mut self, event: FormEvent) {
        match event {
            FormEvent::SetSizeUnit(unit) => self.size_unit = unit,
            FormEvent::SetMarginUnit(unit) => self.margin_unit = unit,
            FormEvent::SetValue {
                axis,
                component,
                value,
            } => {
                let target = self.axis_mut(axis);
                match component {
                    Component::Centimeters => target.centimeters = value,
                    Component::Feet => target.feet = value,
                    Component::Inches => target.inches = value,
                }
            }
            FormEvent::SetMargins(enabled) => self.margins_enabled = enabled,
            FormEvent::SetFilter(filter) => self.filter = filter,
            FormEvent::SetOrientation(orientation) => self.orientation = orientation,
        }
    }

    pub fn axis(&self, axis: Axis) -> &AxisValues {
        match axis {
            Axis::Width => &self.width,
            Axis::Height => &self.height,
            Axis::MarginX => &self.margin_x,
            Axis::MarginY => &self.margin_y,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisValues {
        match axis {
            Axis::Width => &mut self.width,
            Axis::Height => &mut self.height,
            Axis::MarginX => &mut self.margin_x,
            Axis::MarginY => &mut self.margin_y,
        }
    }

    /// The active input for `axis`, honoring the size/margin unit split.
    pub fn input(&self, axis: Axis) -> MeasurementInput {
        let system = match axis {
            Axis::Width | Axis::Height => self.size_unit,
            Axis::MarginX | Axis::MarginY => self.margin_unit,
        };
        self.axis(axis).input(system)
    }
}
