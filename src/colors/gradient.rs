//! Continuous gradient policy.
//!
//! Values between two adjacent control points blend linearly between their
//! colors; values outside the outermost thresholds clamp to the end colors.

use serde::{Deserialize, Serialize};

use super::rgb::{lerp_color, RgbColor};
use crate::error::{HappyMapError, Result};

/// One anchor of a color scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub threshold: f64,
    pub color: RgbColor,
}

impl ControlPoint {
    pub const fn new(threshold: f64, color: RgbColor) -> Self {
        Self { threshold, color }
    }
}

/// Sort control points by descending threshold and reject sets that cannot
/// form a scale: fewer than two points, non-finite thresholds, or repeated
/// thresholds.
pub(crate) fn sorted_descending(points: &[ControlPoint]) -> Result<Vec<ControlPoint>> {
    if points.len() < 2 {
        return Err(HappyMapError::DegenerateRange {
            message: format!("need at least 2 control points, got {}", points.len()),
        });
    }
    if let Some(bad) = points.iter().find(|p| !p.threshold.is_finite()) {
        return Err(HappyMapError::DegenerateRange {
            message: format!("non-finite threshold {}", bad.threshold),
        });
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));

    if let Some(pair) = sorted.windows(2).find(|w| w[0].threshold == w[1].threshold) {
        return Err(HappyMapError::DegenerateRange {
            message: format!("duplicate threshold {}", pair[0].threshold),
        });
    }
    Ok(sorted)
}

/// A validated continuous color scale
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    points: Vec<ControlPoint>,
}

impl Gradient {
    /// Build a gradient from control points in any order
    pub fn new(points: &[ControlPoint]) -> Result<Self> {
        Ok(Self {
            points: sorted_descending(points)?,
        })
    }

    /// Control points, highest threshold first
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Map a value to a color
    pub fn color_for(&self, value: f64) -> Result<RgbColor> {
        if !value.is_finite() {
            return Err(HappyMapError::InvalidParameter {
                param: "value".to_string(),
                message: format!("cannot color non-finite value {}", value),
            });
        }

        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if value >= first.threshold {
            return Ok(first.color);
        }
        if value <= last.threshold {
            return Ok(last.color);
        }

        let (upper, lower) = self
            .points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .find(|(upper, lower)| lower.threshold <= value && value <= upper.threshold)
            .ok_or_else(|| HappyMapError::DegenerateRange {
                message: format!("no control point pair brackets {}", value),
            })?;

        let span = upper.threshold - lower.threshold;
        if span == 0.0 {
            return Err(HappyMapError::DegenerateRange {
                message: format!("zero-width range at threshold {}", lower.threshold),
            });
        }

        let t = (value - lower.threshold) / span;
        Ok(lerp_color(lower.color, upper.color, t))
    }
}
