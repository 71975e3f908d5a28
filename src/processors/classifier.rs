use crate::error::{ProcessingError, Result};
use crate::models::QuantityKind;
use crate::utils::constants::{
    FILE_MARKER_TMAX, FILE_MARKER_TMIN, MARKER_MEAN_CELSIUS, MARKER_MEAN_MM,
};

/// What a descriptor-line marker tells us about the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerClass {
    /// The marker settles the quantity on its own
    Quantity(QuantityKind),
    /// Temperature; the file name decides between minimum and maximum
    Temperature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorRule {
    pub marker: String,
    pub class: MarkerClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameRule {
    pub marker: String,
    pub quantity: QuantityKind,
}

/// Resolves the quantity of a source file from its descriptor line and name.
///
/// Both rule tables are evaluated in order and the first substring match
/// wins.
#[derive(Debug, Clone)]
pub struct HeaderClassifier {
    descriptor_rules: Vec<DescriptorRule>,
    file_name_rules: Vec<FileNameRule>,
}

impl HeaderClassifier {
    pub fn new(descriptor_rules: Vec<DescriptorRule>, file_name_rules: Vec<FileNameRule>) -> Self {
        Self {
            descriptor_rules,
            file_name_rules,
        }
    }

    pub fn with_descriptor_rule(mut self, marker: &str, class: MarkerClass) -> Self {
        self.descriptor_rules.push(DescriptorRule {
            marker: marker.to_string(),
            class,
        });
        self
    }

    pub fn with_file_name_rule(mut self, marker: &str, quantity: QuantityKind) -> Self {
        self.file_name_rules.push(FileNameRule {
            marker: marker.to_string(),
            quantity,
        });
        self
    }

    pub fn classify(&self, descriptor_line: &str, file_name: &str) -> Result<QuantityKind> {
        let rule = self
            .descriptor_rules
            .iter()
            .find(|rule| descriptor_line.contains(rule.marker.as_str()))
            .ok_or_else(|| ProcessingError::UnrecognizedParameter {
                descriptor: descriptor_line.trim().to_string(),
            })?;

        match rule.class {
            MarkerClass::Quantity(quantity) => Ok(quantity),
            MarkerClass::Temperature => self
                .file_name_rules
                .iter()
                .find(|rule| file_name.contains(rule.marker.as_str()))
                .map(|rule| rule.quantity)
                .ok_or_else(|| ProcessingError::AmbiguousTemperature {
                    file_name: file_name.to_string(),
                }),
        }
    }
}

impl Default for HeaderClassifier {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
            .with_descriptor_rule(
                MARKER_MEAN_MM,
                MarkerClass::Quantity(QuantityKind::Precipitation),
            )
            .with_descriptor_rule(MARKER_MEAN_CELSIUS, MarkerClass::Temperature)
            .with_file_name_rule(FILE_MARKER_TMIN, QuantityKind::MinimumTemperature)
            .with_file_name_rule(FILE_MARKER_TMAX, QuantityKind::MaximumTemperature)
    }
}
