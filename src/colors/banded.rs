//! Discrete banding policy.
//!
//! Bands are checked top-down with a strict comparison; the first band whose
//! bound the value passes wins. Values passing no band get the fallback color.

use serde::Serialize;

use super::gradient::{sorted_descending, ControlPoint};
use super::policy::Polarity;
use super::rgb::RgbColor;
use crate::error::{HappyMapError, Result};

/// Direction of the strict band comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Band matches when `value > bound`
    Above,
    /// Band matches when `value < bound`
    Below,
}

impl Comparison {
    fn passes(self, value: f64, bound: f64) -> bool {
        match self {
            Comparison::Above => value > bound,
            Comparison::Below => value < bound,
        }
    }
}

impl From<Polarity> for Comparison {
    fn from(polarity: Polarity) -> Self {
        match polarity {
            Polarity::HigherIsBetter => Comparison::Above,
            Polarity::LowerIsBetter => Comparison::Below,
        }
    }
}

/// One step of a banded scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    /// Exclusive bound the value must pass
    pub bound: f64,
    pub color: RgbColor,
}

/// A stepped color scale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandTable {
    bands: Vec<Band>,
    fallback: RgbColor,
    comparison: Comparison,
}

impl BandTable {
    /// Build a table from bands already in evaluation order.
    pub fn new(bands: Vec<Band>, fallback: RgbColor, comparison: Comparison) -> Result<Self> {
        if bands.is_empty() {
            return Err(HappyMapError::DegenerateRange {
                message: "band table has no bands".to_string(),
            });
        }
        if let Some(bad) = bands.iter().find(|b| !b.bound.is_finite()) {
            return Err(HappyMapError::DegenerateRange {
                message: format!("non-finite band bound {}", bad.bound),
            });
        }
        Ok(Self {
            bands,
            fallback,
            comparison,
        })
    }

    /// Derive bands from a metric's control points.
    ///
    /// Higher-is-better: each point above the lowest becomes a `value > t`
    /// band with its own color, the lowest point's color is the fallback.
    /// Lower-is-better: walking up from the lowest point, each bound `t` takes
    /// the color of the point just below it, and the highest point's color is
    /// the fallback.
    pub fn from_control_points(points: &[ControlPoint], polarity: Polarity) -> Result<Self> {
        let descending = sorted_descending(points)?;
        match polarity {
            Polarity::HigherIsBetter => {
                let (worst, rest) = descending
                    .split_last()
                    .ok_or_else(|| HappyMapError::DegenerateRange {
                        message: "no control points".to_string(),
                    })?;
                let bands = rest
                    .iter()
                    .map(|p| Band {
                        bound: p.threshold,
                        color: p.color,
                    })
                    .collect();
                Self::new(bands, worst.color, Comparison::Above)
            }
            Polarity::LowerIsBetter => {
                let ascending: Vec<ControlPoint> = descending.into_iter().rev().collect();
                let bands = ascending
                    .windows(2)
                    .map(|w| Band {
                        bound: w[1].threshold,
                        color: w[0].color,
                    })
                    .collect();
                let worst = ascending[ascending.len() - 1];
                Self::new(bands, worst.color, Comparison::Below)
            }
        }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn fallback(&self) -> RgbColor {
        self.fallback
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Map a value to the color of the first band it passes
    pub fn color_for(&self, value: f64) -> Result<RgbColor> {
        if !value.is_finite() {
            return Err(HappyMapError::InvalidParameter {
                param: "value".to_string(),
                message: format!("cannot color non-finite value {}", value),
            });
        }
        Ok(self
            .bands
            .iter()
            .find(|band| self.comparison.passes(value, band.bound))
            .map(|band| band.color)
            .unwrap_or(self.fallback))
    }
}
