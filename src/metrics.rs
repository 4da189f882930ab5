//! Metric registry.
//!
//! A closed set of survey metrics, each with the source field it is read
//! from, the label used in tooltips, its polarity, and the control points of
//! its color scale. Color policies are built and validated once, when the
//! registry is constructed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::colors::{
    BandTable, ColorPolicy, ColorStrategy, ControlPoint, Gradient, Polarity, RgbColor,
};
use crate::error::{HappyMapError, Result};
use crate::models::DataRow;

pub const GREEN: RgbColor = RgbColor::from_u32(0x2ECC71);
pub const YELLOW: RgbColor = RgbColor::from_u32(0xF1C40F);
pub const ORANGE: RgbColor = RgbColor::from_u32(0xE67E22);
pub const RED: RgbColor = RgbColor::from_u32(0xE74C3C);

/// Identifier of a supported metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    #[default]
    Happiness,
    Gdp,
    SocialSupport,
    LifeExpectancy,
    Freedom,
    Generosity,
    Corruption,
    PositiveAffect,
    NegativeAffect,
}

impl MetricId {
    pub const ALL: [MetricId; 9] = [
        MetricId::Happiness,
        MetricId::Gdp,
        MetricId::SocialSupport,
        MetricId::LifeExpectancy,
        MetricId::Freedom,
        MetricId::Generosity,
        MetricId::Corruption,
        MetricId::PositiveAffect,
        MetricId::NegativeAffect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricId::Happiness => "happiness",
            MetricId::Gdp => "gdp",
            MetricId::SocialSupport => "social_support",
            MetricId::LifeExpectancy => "life_expectancy",
            MetricId::Freedom => "freedom",
            MetricId::Generosity => "generosity",
            MetricId::Corruption => "corruption",
            MetricId::PositiveAffect => "positive_affect",
            MetricId::NegativeAffect => "negative_affect",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricId {
    type Err = HappyMapError;

    fn from_str(s: &str) -> Result<Self> {
        MetricId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| HappyMapError::UnknownMetric { id: s.to_string() })
    }
}

/// Static description of one metric
struct MetricTemplate {
    id: MetricId,
    field_name: &'static str,
    label: &'static str,
    polarity: Polarity,
    control_points: [(f64, RgbColor); 4],
}

const METRIC_TEMPLATES: [MetricTemplate; 9] = [
    MetricTemplate {
        id: MetricId::Happiness,
        field_name: "Life Ladder",
        label: "Happiness Score",
        polarity: Polarity::HigherIsBetter,
        control_points: [(7.0, GREEN), (5.0, YELLOW), (3.0, ORANGE), (0.0, RED)],
    },
    MetricTemplate {
        id: MetricId::Gdp,
        field_name: "Log GDP per capita",
        label: "Log GDP per Capita",
        polarity: Polarity::HigherIsBetter,
        control_points: [(11.0, GREEN), (9.0, YELLOW), (3.0, ORANGE), (0.0, RED)],
    },
    MetricTemplate {
        id: MetricId::SocialSupport,
        field_name: "Social support",
        label: "Social Support",
        polarity: Polarity::HigherIsBetter,
        control_points: [(0.8, GREEN), (0.6, YELLOW), (0.4, ORANGE), (0.0, RED)],
    },
    MetricTemplate {
        id: MetricId::LifeExpectancy,
        field_name: "Healthy life expectancy at birth",
        label: "Life Expectancy",
        polarity: Polarity::HigherIsBetter,
        control_points: [(70.0, GREEN), (60.0, YELLOW), (50.0, ORANGE), (0.0, RED)],
    },
    MetricTemplate {
        id: MetricId::Freedom,
        field_name: "Freedom to make life choices",
        label: "Freedom",
        polarity: Polarity::HigherIsBetter,
        control_points: [(0.7, GREEN), (0.5, YELLOW), (0.3, ORANGE), (0.0, RED)],
    },
    MetricTemplate {
        id: MetricId::Generosity,
        field_name: "Generosity",
        label: "Generosity",
        polarity: Polarity::HigherIsBetter,
        control_points: [(0.3, GREEN), (0.2, YELLOW), (0.1, ORANGE), (0.0, RED)],
    },
    MetricTemplate {
        id: MetricId::Corruption,
        field_name: "Perceptions of corruption",
        label: "Perceptions of Corruption",
        polarity: Polarity::LowerIsBetter,
        control_points: [(0.7, RED), (0.5, ORANGE), (0.3, YELLOW), (0.0, GREEN)],
    },
    MetricTemplate {
        id: MetricId::PositiveAffect,
        field_name: "Positive affect",
        label: "Positive Affect",
        polarity: Polarity::HigherIsBetter,
        control_points: [(0.6, GREEN), (0.5, YELLOW), (0.4, ORANGE), (0.0, RED)],
    },
    MetricTemplate {
        id: MetricId::NegativeAffect,
        field_name: "Negative affect",
        label: "Negative Affect",
        polarity: Polarity::LowerIsBetter,
        control_points: [(0.4, RED), (0.3, ORANGE), (0.2, YELLOW), (0.0, GREEN)],
    },
];

/// A metric with its validated color scales
#[derive(Debug, Clone, Serialize)]
pub struct MetricDefinition {
    pub id: MetricId,
    pub field_name: &'static str,
    pub label: &'static str,
    pub polarity: Polarity,
    pub control_points: Vec<ControlPoint>,
    #[serde(skip)]
    gradient: Gradient,
    #[serde(skip)]
    bands: BandTable,
}

impl MetricDefinition {
    /// Build a definition, validating its control points for both policies
    pub fn new(
        id: MetricId,
        field_name: &'static str,
        label: &'static str,
        polarity: Polarity,
        control_points: Vec<ControlPoint>,
    ) -> Result<Self> {
        let gradient = Gradient::new(&control_points)?;
        let bands = BandTable::from_control_points(&control_points, polarity)?;
        Ok(Self {
            id,
            field_name,
            label,
            polarity,
            control_points,
            gradient,
            bands,
        })
    }

    /// Color policy for the given strategy
    pub fn policy(&self, strategy: ColorStrategy) -> &dyn ColorPolicy {
        match strategy {
            ColorStrategy::Gradient => &self.gradient,
            ColorStrategy::Banded => &self.bands,
        }
    }

    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    /// Read this metric's value from a row
    pub fn extract(&self, row: &DataRow) -> Option<f64> {
        row.value(self.field_name)
    }

    /// Shorthand for `policy(strategy).color_for(value)`
    pub fn color_for(&self, value: f64, strategy: ColorStrategy) -> Result<RgbColor> {
        self.policy(strategy).color_for(value)
    }
}

/// Lookup table from metric id to definition
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    definitions: Vec<MetricDefinition>,
}

impl MetricRegistry {
    /// Build the registry of built-in metrics.
    ///
    /// Fails with `DegenerateRange` if any static control-point table is
    /// malformed.
    pub fn builtin() -> Result<Self> {
        let definitions = METRIC_TEMPLATES
            .iter()
            .map(|spec| {
                let points = spec
                    .control_points
                    .iter()
                    .map(|&(threshold, color)| ControlPoint::new(threshold, color))
                    .collect();
                MetricDefinition::new(spec.id, spec.field_name, spec.label, spec.polarity, points)
            })
            .collect::<Result<Vec<_>>>()?;

        // Definitions are indexed by MetricId discriminant
        for (i, def) in definitions.iter().enumerate() {
            if def.id.index() != i {
                return Err(HappyMapError::Config {
                    message: format!("metric table out of order at {}", def.id),
                });
            }
        }

        Ok(Self { definitions })
    }

    /// Definition for a known id
    pub fn get(&self, id: MetricId) -> &MetricDefinition {
        &self.definitions[id.index()]
    }

    /// Definition for a metric id string
    pub fn lookup(&self, id: &str) -> Result<&MetricDefinition> {
        Ok(self.get(id.parse()?))
    }

    /// Value of the metric on a row; `Ok(None)` when the row lacks it
    pub fn extract_value(&self, row: &DataRow, id: &str) -> Result<Option<f64>> {
        Ok(self.lookup(id)?.extract(row))
    }

    /// All definitions in registry order
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }
}
