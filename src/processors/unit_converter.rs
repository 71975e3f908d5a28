use crate::models::QuantityKind;
use crate::utils::constants::{CBH_DECIMALS, MM_PER_INCH, PRECIP_ZERO_THRESHOLD_MM};

/// Converts GDP source units (mm, °C) into the units PRMS expects (in, °F).
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitConverter;

impl UnitConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert a raw source value into model units.
    ///
    /// Precipitation at or below [`PRECIP_ZERO_THRESHOLD_MM`] (including
    /// negative noise) becomes exactly zero.
    pub fn convert(&self, kind: QuantityKind, raw: f64) -> f64 {
        match kind {
            QuantityKind::Precipitation => {
                if raw <= PRECIP_ZERO_THRESHOLD_MM {
                    0.0
                } else {
                    raw / MM_PER_INCH
                }
            }
            QuantityKind::MinimumTemperature | QuantityKind::MaximumTemperature => {
                raw * (9.0 / 5.0) + 32.0
            }
        }
    }

    /// Convert and format with exactly four fractional digits.
    pub fn format_value(&self, kind: QuantityKind, raw: f64) -> String {
        format!("{:.*}", CBH_DECIMALS, self.convert(kind, raw))
    }
}
