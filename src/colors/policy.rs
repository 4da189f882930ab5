//! Color policy trait and named strategies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::banded::BandTable;
use super::gradient::{ControlPoint, Gradient};
use super::rgb::RgbColor;
use crate::error::{HappyMapError, Result};

/// Whether higher or lower raw values count as better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// Trait for value-to-color implementations
pub trait ColorPolicy: Send + Sync {
    /// Map a raw metric value to a display color
    fn color_for(&self, value: f64) -> Result<RgbColor>;

    /// Get the name of this policy
    fn name(&self) -> &str;
}

impl ColorPolicy for Gradient {
    fn color_for(&self, value: f64) -> Result<RgbColor> {
        Gradient::color_for(self, value)
    }

    fn name(&self) -> &str {
        ColorStrategy::Gradient.as_str()
    }
}

impl ColorPolicy for BandTable {
    fn color_for(&self, value: f64) -> Result<RgbColor> {
        BandTable::color_for(self, value)
    }

    fn name(&self) -> &str {
        ColorStrategy::Banded.as_str()
    }
}

/// The two supported policies.
///
/// They disagree at boundaries (the gradient clamps inclusively, bands
/// compare strictly) and are kept as separate strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorStrategy {
    #[default]
    Gradient,
    Banded,
}

impl ColorStrategy {
    pub const ALL: [ColorStrategy; 2] = [ColorStrategy::Gradient, ColorStrategy::Banded];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorStrategy::Gradient => "gradient",
            ColorStrategy::Banded => "banded",
        }
    }

    /// Build this policy for a set of control points
    pub fn build(
        self,
        points: &[ControlPoint],
        polarity: Polarity,
    ) -> Result<Box<dyn ColorPolicy>> {
        match self {
            ColorStrategy::Gradient => Ok(Box::new(Gradient::new(points)?)),
            ColorStrategy::Banded => Ok(Box::new(BandTable::from_control_points(
                points, polarity,
            )?)),
        }
    }
}

impl fmt::Display for ColorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorStrategy {
    type Err = HappyMapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gradient" => Ok(ColorStrategy::Gradient),
            "banded" => Ok(ColorStrategy::Banded),
            _ => Err(HappyMapError::InvalidParameter {
                param: "policy".to_string(),
                message: format!("Unknown color policy: {}. Must be one of: gradient, banded", s),
            }),
        }
    }
}

/// Get a color policy by name
pub fn get_policy(
    name: &str,
    points: &[ControlPoint],
    polarity: Polarity,
) -> Result<Box<dyn ColorPolicy>> {
    name.parse::<ColorStrategy>()?.build(points, polarity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<ControlPoint> {
        vec![
            ControlPoint::new(7.0, RgbColor::from_u32(0x2ECC71)),
            ControlPoint::new(5.0, RgbColor::from_u32(0xF1C40F)),
            ControlPoint::new(3.0, RgbColor::from_u32(0xE67E22)),
            ControlPoint::new(0.0, RgbColor::from_u32(0xE74C3C)),
        ]
    }

    #[test]
    fn test_policy_names() {
        let gradient = get_policy("gradient", &points(), Polarity::HigherIsBetter).unwrap();
        let banded = get_policy("Banded", &points(), Polarity::HigherIsBetter).unwrap();
        assert_eq!(gradient.name(), "gradient");
        assert_eq!(banded.name(), "banded");
    }

    #[test]
    fn test_unknown_policy() {
        let err = get_policy("smooth", &points(), Polarity::HigherIsBetter)
            .err()
            .unwrap();
        assert!(matches!(err, HappyMapError::InvalidParameter { .. }));
    }

    #[test]
    fn test_strategies_differ_between_bands() {
        let gradient = ColorStrategy::Gradient
            .build(&points(), Polarity::HigherIsBetter)
            .unwrap();
        let banded = ColorStrategy::Banded
            .build(&points(), Polarity::HigherIsBetter)
            .unwrap();

        // Exactly on a threshold the gradient hits the anchor, bands step down
        assert_eq!(gradient.color_for(5.0).unwrap(), RgbColor::from_u32(0xF1C40F));
        assert_eq!(banded.color_for(5.0).unwrap(), RgbColor::from_u32(0xE67E22));
        // Between anchors only the gradient blends
        assert_ne!(gradient.color_for(6.0).unwrap(), banded.color_for(6.0).unwrap());
    }

    #[test]
    fn test_strategy_serde() {
        assert_eq!(serde_json::to_string(&ColorStrategy::Banded).unwrap(), r#""banded""#);
        let parsed: ColorStrategy = serde_json::from_str(r#""gradient""#).unwrap();
        assert_eq!(parsed, ColorStrategy::Gradient);
        assert_eq!(ColorStrategy::default(), ColorStrategy::Gradient);
    }
}
