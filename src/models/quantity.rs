use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical quantity carried by a Geo Data Portal download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuantityKind {
    Precipitation,
    MinimumTemperature,
    MaximumTemperature,
}

/// Which name is written on the second line of a CBH header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// Long names (`precipitation`, `minimum-temperature`, `maximum-temperature`)
    #[default]
    Descriptive,
    /// PRMS variable names (`prcp`, `tmin`, `tmax`)
    Prms,
}

impl QuantityKind {
    /// Variable name as PRMS reads it from a CBH file
    pub fn prms_name(&self) -> &'static str {
        match self {
            QuantityKind::Precipitation => "prcp",
            QuantityKind::MinimumTemperature => "tmin",
            QuantityKind::MaximumTemperature => "tmax",
        }
    }

    pub fn descriptive_name(&self) -> &'static str {
        match self {
            QuantityKind::Precipitation => "precipitation",
            QuantityKind::MinimumTemperature => "minimum-temperature",
            QuantityKind::MaximumTemperature => "maximum-temperature",
        }
    }

    pub fn label(&self, style: LabelStyle) -> &'static str {
        match style {
            LabelStyle::Prms => self.prms_name(),
            LabelStyle::Descriptive => self.descriptive_name(),
        }
    }

    pub fn source_units(&self) -> &'static str {
        match self {
            QuantityKind::Precipitation => "mm",
            QuantityKind::MinimumTemperature | QuantityKind::MaximumTemperature => "°C",
        }
    }

    pub fn model_units(&self) -> &'static str {
        match self {
            QuantityKind::Precipitation => "in",
            QuantityKind::MinimumTemperature | QuantityKind::MaximumTemperature => "°F",
        }
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptive_name())
    }
}
